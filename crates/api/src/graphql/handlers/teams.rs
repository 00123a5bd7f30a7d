// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{FieldResult, graphql_object};

use crate::db::models::{Team, User, UserRole};
use crate::engine::registration;
use crate::graphql::Context;
use crate::store::RegistrationStore;

fn require_participant(ctx: &Context) -> FieldResult<crate::graphql::AuthenticatedUser> {
    let user = ctx.require_authentication()?;
    // Admins manage games; they do not compete in them.
    if user.role == UserRole::Admin {
        return Err(juniper::FieldError::new(
            "Admins cannot register for games",
            juniper::Value::null(),
        ));
    }
    Ok(user)
}

pub async fn register_single(ctx: &Context, game_id: uuid::Uuid) -> FieldResult<bool> {
    let current_user = require_participant(ctx)?;
    registration::register_single(ctx.store(), current_user.user_id, game_id).await?;
    tracing::info!(user_id = %current_user.user_id, %game_id, "single registration");
    Ok(true)
}

pub async fn create_team(
    ctx: &Context,
    game_id: uuid::Uuid,
    team_name: String,
) -> FieldResult<Team> {
    let current_user = require_participant(ctx)?;
    if team_name.trim().is_empty() {
        return Err(juniper::FieldError::new(
            "Team name must not be empty",
            juniper::Value::null(),
        ));
    }
    let team =
        registration::create_team(ctx.store(), current_user.user_id, game_id, team_name.trim())
            .await?;
    tracing::info!(team_id = %team.id, %game_id, "team created");
    Ok(team)
}

pub async fn join_team(ctx: &Context, team_code: String) -> FieldResult<Team> {
    let current_user = require_participant(ctx)?;
    let team = registration::join_team_by_code(ctx.store(), current_user.user_id, &team_code).await?;
    tracing::info!(user_id = %current_user.user_id, team_id = %team.id, "joined team");
    Ok(team)
}

pub async fn get_teams(ctx: &Context) -> FieldResult<Vec<Team>> {
    ctx.require_admin()?;
    Ok(ctx.store().list_teams().await?)
}

#[graphql_object]
#[graphql(context = Context)]
impl Team {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn team_code(&self, ctx: &Context) -> FieldResult<&str> {
        // Shareable, but only by people already on the team (or admins).
        if ctx
            .user
            .as_ref()
            .is_some_and(|u| u.role == UserRole::Admin || u.team_id == Some(self.id))
        {
            Ok(&self.team_code)
        } else {
            Err(juniper::FieldError::new(
                "Permission denied to view team code",
                juniper::Value::null(),
            ))
        }
    }

    pub async fn game(&self, ctx: &Context) -> FieldResult<Option<crate::db::models::Game>> {
        Ok(ctx.store().game_by_id(self.game_id).await?)
    }

    pub async fn leader(&self, ctx: &Context) -> FieldResult<Option<User>> {
        Ok(ctx.store().user_by_id(self.leader_user_id).await?)
    }

    /// Non-leader members; the leader is part of the team without a
    /// membership row.
    pub async fn members(&self, ctx: &Context) -> FieldResult<Vec<User>> {
        Ok(ctx.store().team_member_users(self.id).await?)
    }

    pub async fn member_count(&self, ctx: &Context) -> FieldResult<i32> {
        let members = ctx.store().membership_count(self.id).await?;
        Ok(members as i32 + 1)
    }
}
