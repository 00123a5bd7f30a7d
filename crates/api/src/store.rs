// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{
    CertificateSettings, Game, NewGame, NewTeam, NewUser, Team, User, WhitelistPhone,
};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by persistence adapters regardless of the backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(String),
    #[error("conflicting row already exists")]
    Conflict,
}

/// Fields of a user profile an admin may rewrite. `None` leaves the
/// column untouched.
#[derive(Debug, Default, Clone)]
pub struct UserProfileChanges {
    pub display_name: Option<String>,
    pub class_section: Option<String>,
    pub password_hash: Option<String>,
}

impl UserProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.class_section.is_none() && self.password_hash.is_none()
    }
}

/// Persistence boundary of the registration engine.
///
/// Reads are plain row lookups. The mutating operations marked as
/// *conditional* re-check their capacity / assignment precondition
/// atomically (a serializable transaction in the Postgres adapter, a
/// single mutex in the in-memory one) and report `false` / `None` when
/// the precondition no longer holds, so two racing registrations can
/// never overcommit a slot.
#[async_trait::async_trait]
pub trait RegistrationStore: Send + Sync {
    // --- users ---
    async fn user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_phone(&self, phone: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Insert a user; fails with [`StoreError::Conflict`] if the phone is taken.
    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn update_user_profile(
        &self,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> StoreResult<bool>;
    /// Delete the user row itself. The caller must have released any
    /// registration first.
    async fn delete_user_row(&self, user_id: Uuid) -> StoreResult<bool>;

    // --- games ---
    async fn game_by_id(&self, game_id: Uuid) -> StoreResult<Option<Game>>;
    async fn list_games(&self) -> StoreResult<Vec<Game>>;
    async fn insert_game(&self, new_game: NewGame) -> StoreResult<Game>;
    /// Users directly assigned to a single-type game (no team).
    async fn occupied_single_slots(&self, game_id: Uuid) -> StoreResult<i64>;
    /// Teams formed under a team-type game.
    async fn occupied_team_slots(&self, game_id: Uuid) -> StoreResult<i64>;
    async fn single_entrants(&self, game_id: Uuid) -> StoreResult<Vec<User>>;

    // --- teams ---
    async fn team_by_id(&self, team_id: Uuid) -> StoreResult<Option<Team>>;
    async fn team_by_code(&self, team_code: &str) -> StoreResult<Option<Team>>;
    async fn team_by_leader(&self, leader_user_id: Uuid) -> StoreResult<Option<Team>>;
    async fn teams_of_game(&self, game_id: Uuid) -> StoreResult<Vec<Team>>;
    async fn list_teams(&self) -> StoreResult<Vec<Team>>;
    async fn team_code_exists(&self, team_code: &str) -> StoreResult<bool>;
    /// Membership rows only; the leader is not counted.
    async fn membership_count(&self, team_id: Uuid) -> StoreResult<i64>;
    async fn team_member_users(&self, team_id: Uuid) -> StoreResult<Vec<User>>;

    // --- conditional registration mutations ---
    /// Assign an unregistered user to a single-type game if a slot is
    /// still free.
    async fn assign_single(&self, user_id: Uuid, game_id: Uuid) -> StoreResult<bool>;
    /// Create a team and assign its leader if a team slot is still free
    /// and the leader is still unregistered.
    async fn create_team_with_leader(&self, new_team: NewTeam) -> StoreResult<Option<Team>>;
    /// Add a membership row and assign the user if the team still has
    /// room and the user is still unregistered.
    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    /// Create a team with leader and members in one shot. Nothing is
    /// written unless every assignment succeeds.
    async fn create_team_roster(
        &self,
        new_team: NewTeam,
        member_ids: &[Uuid],
    ) -> StoreResult<Option<Team>>;

    // --- cascades ---
    /// Drop a user's membership row (if any) and null their assignment.
    /// A no-op for unregistered users.
    async fn release_user(&self, user_id: Uuid) -> StoreResult<()>;
    /// Unassign leader and members, drop all membership rows, delete the
    /// team.
    async fn dissolve_team(&self, team_id: Uuid) -> StoreResult<bool>;
    /// Unassign every entrant, delete the game's teams and memberships,
    /// then the game itself.
    async fn delete_game_cascade(&self, game_id: Uuid) -> StoreResult<bool>;
    /// Delete all memberships and teams and unregister every participant,
    /// then delete all non-admin users. Games and whitelist stay.
    async fn clear_participants(&self) -> StoreResult<()>;
    /// Full event reset: participants, teams, games and whitelist.
    async fn clear_event(&self) -> StoreResult<()>;

    // --- whitelist ---
    async fn whitelist_contains(&self, phone: &str) -> StoreResult<bool>;
    async fn list_whitelist(&self) -> StoreResult<Vec<WhitelistPhone>>;
    async fn add_whitelist_phone(&self, phone: &str) -> StoreResult<bool>;
    async fn remove_whitelist_phone(&self, phone: &str) -> StoreResult<bool>;

    // --- certificates ---
    async fn certificate_settings(&self) -> StoreResult<CertificateSettings>;
    async fn update_certificate_settings(
        &self,
        certificates_enabled: bool,
        event_name: String,
        event_date: NaiveDate,
    ) -> StoreResult<CertificateSettings>;
}
