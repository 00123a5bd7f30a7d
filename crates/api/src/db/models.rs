// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, NaiveDate, Utc};
use diesel::associations::Identifiable;
use diesel::prelude::*;
use juniper::GraphQLEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::*;

#[derive(
    diesel_derive_enum::DbEnum,
    Debug,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Ord,
    PartialOrd,
    GraphQLEnum,
)]
#[DbValueStyle = "UPPERCASE"]
#[ExistingTypePath = "crate::db::schema::sql_types::UserRole"]
pub enum UserRole {
    Participant,
    Admin,
}

#[derive(
    diesel_derive_enum::DbEnum,
    Debug,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    GraphQLEnum,
)]
#[DbValueStyle = "UPPERCASE"]
#[ExistingTypePath = "crate::db::schema::sql_types::GameType"]
pub enum GameType {
    /// Each slot seats one directly registered participant.
    Single,
    /// Each slot seats one team; members are bounded by `team_size`.
    Team,
}

/* =========================
 * USERS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub display_name: String,
    pub class_section: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub game_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Registered for any game, as a single participant or through a team.
    pub fn is_registered(&self) -> bool {
        self.game_id.is_some()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub phone: String,
    pub display_name: String,
    pub class_section: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
}

/* =========================
 * GAMES
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub game_type: GameType,
    pub slots: i32,
    pub team_size: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = games)]
pub struct NewGame {
    pub name: String,
    pub description: String,
    pub game_type: GameType,
    pub slots: i32,
    pub team_size: Option<i32>,
}

/* =========================
 * TEAMS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = teams)]
#[diesel(belongs_to(Game))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub game_id: Uuid,
    pub leader_user_id: Uuid,
    pub team_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub name: String,
    pub game_id: Uuid,
    pub leader_user_id: Uuid,
    pub team_code: String,
}

/* =========================
 * TEAM MEMBERS
 * ========================= */

// Link rows for non-leader members; the leader has no row here.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = team_members)]
#[diesel(belongs_to(Team))]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = team_members)]
pub struct NewTeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
}

/* =========================
 * WHITELIST
 * ========================= */

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = whitelist_phones)]
#[diesel(primary_key(phone))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WhitelistPhone {
    pub phone: String,
    pub added_at: DateTime<Utc>,
}

/* =========================
 * SESSIONS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Associations, Debug)]
#[diesel(table_name = sessions)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<ipnet::IpNet>,
    pub session_token: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub user_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<ipnet::IpNet>,
    pub session_token: String,
}

/* =========================
 * CERTIFICATE SETTINGS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = certificate_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CertificateSettings {
    pub id: Uuid,
    pub certificates_enabled: bool,
    pub event_name: String,
    pub event_date: NaiveDate,
}
