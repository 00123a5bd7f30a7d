// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{FieldResult, GraphQLObject, graphql_object};

use crate::db::models::{Game, GameType, NewGame, Team, User, UserRole};
use crate::engine::{registration, roster};
use crate::graphql::Context;
use crate::store::RegistrationStore;

/// The competition as seen by a registered participant: fellow single
/// entrants or rival teams, whichever the game type calls for.
#[derive(GraphQLObject)]
#[graphql(context = Context)]
pub struct OpponentsView {
    pub entrants: Vec<User>,
    pub teams: Vec<Team>,
}

pub async fn get_opponents(context: &Context) -> FieldResult<OpponentsView> {
    let viewer = context.require_authentication()?;
    let view = match registration::opponents(context.store(), viewer.user_id).await? {
        registration::Opponents::Entrants(entrants) => OpponentsView {
            entrants,
            teams: Vec::new(),
        },
        registration::Opponents::Teams(teams) => OpponentsView {
            entrants: Vec::new(),
            teams,
        },
    };
    Ok(view)
}

pub async fn get_games(context: &Context) -> FieldResult<Vec<Game>> {
    Ok(context.store().list_games().await?)
}

pub async fn get_game_by_id(context: &Context, game_id: uuid::Uuid) -> FieldResult<Option<Game>> {
    Ok(context.store().game_by_id(game_id).await?)
}

pub async fn create_game(
    context: &Context,
    name: String,
    description: String,
    game_type: GameType,
    slots: i32,
    team_size: Option<i32>,
) -> FieldResult<Game> {
    context.require_admin()?;
    if name.trim().is_empty() {
        return Err(juniper::FieldError::new(
            "Game name must not be empty",
            juniper::Value::null(),
        ));
    }
    if slots <= 0 {
        return Err(juniper::FieldError::new(
            "Slots must be a positive number",
            juniper::Value::null(),
        ));
    }
    match game_type {
        GameType::Team if !team_size.is_some_and(|s| s >= 1) => {
            return Err(juniper::FieldError::new(
                "Team games need a team size of at least 1",
                juniper::Value::null(),
            ));
        }
        _ => {}
    }
    let game = context
        .store()
        .insert_game(NewGame {
            name,
            description,
            game_type,
            slots,
            // Only meaningful for team games.
            team_size: match game_type {
                GameType::Team => team_size,
                GameType::Single => None,
            },
        })
        .await?;
    tracing::info!(game_id = %game.id, name = %game.name, "game created");
    Ok(game)
}

pub async fn delete_game(context: &Context, game_id: uuid::Uuid) -> FieldResult<bool> {
    context.require_admin()?;
    roster::delete_game(context.store(), game_id).await?;
    tracing::info!(%game_id, "game deleted");
    Ok(true)
}

#[graphql_object]
#[graphql(context = Context)]
impl Game {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn game_type(&self) -> GameType {
        self.game_type
    }

    pub fn slots(&self) -> i32 {
        self.slots
    }

    pub fn team_size(&self) -> Option<i32> {
        self.team_size
    }

    /// Free seats (single games) or free team slots (team games).
    pub async fn available_slots(&self, ctx: &Context) -> FieldResult<i32> {
        Ok(registration::available_slots(ctx.store(), self).await?)
    }

    pub async fn teams(&self, ctx: &Context) -> FieldResult<Vec<Team>> {
        Ok(ctx.store().teams_of_game(self.id).await?)
    }

    /// Visible to admins and to participants registered for this game.
    pub async fn entrants(&self, ctx: &Context) -> FieldResult<Vec<User>> {
        let viewer = ctx.require_authentication()?;
        if viewer.role != UserRole::Admin {
            let registered_here = ctx
                .store()
                .user_by_id(viewer.user_id)
                .await?
                .is_some_and(|u| u.game_id == Some(self.id));
            if !registered_here {
                return Err(juniper::FieldError::new(
                    "Permission denied to view entrants",
                    juniper::Value::null(),
                ));
            }
        }
        Ok(ctx.store().single_entrants(self.id).await?)
    }
}
