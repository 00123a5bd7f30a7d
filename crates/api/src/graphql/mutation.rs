// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{FieldResult, graphql_object};

use crate::db::models::{GameType, Team, User};
use crate::graphql::handlers::{self, sessions::SessionCredentials};

use super::Context;

pub struct Mutation;

#[graphql_object]
#[graphql(
    context = Context,
)]
impl Mutation {
    async fn sign_up(
        context: &Context,
        phone: String,
        display_name: String,
        class_section: Option<String>,
        password: String,
    ) -> FieldResult<User> {
        handlers::accounts::sign_up(context, phone, display_name, class_section, password).await
    }

    async fn login(
        context: &Context,
        phone: String,
        password: String,
    ) -> FieldResult<SessionCredentials> {
        handlers::accounts::login(context, phone, password).await
    }

    async fn refresh_session(
        context: &Context,
        refresh_token: String,
    ) -> FieldResult<SessionCredentials> {
        handlers::sessions::refresh_session(context, refresh_token).await
    }

    async fn end_session(context: &Context, refresh_token: String) -> FieldResult<bool> {
        handlers::sessions::end_session(context, refresh_token).await
    }

    async fn register_single(context: &Context, game_id: String) -> FieldResult<bool> {
        let game_id = uuid::Uuid::parse_str(&game_id)?;
        handlers::teams::register_single(context, game_id).await
    }

    async fn create_team(
        context: &Context,
        game_id: String,
        team_name: String,
    ) -> FieldResult<Team> {
        let game_id = uuid::Uuid::parse_str(&game_id)?;
        handlers::teams::create_team(context, game_id, team_name).await
    }

    async fn join_team(context: &Context, team_code: String) -> FieldResult<Team> {
        handlers::teams::join_team(context, team_code).await
    }

    async fn create_game(
        context: &Context,
        name: String,
        description: String,
        game_type: GameType,
        slots: i32,
        team_size: Option<i32>,
    ) -> FieldResult<crate::db::models::Game> {
        handlers::games::create_game(context, name, description, game_type, slots, team_size).await
    }

    async fn delete_game(context: &Context, game_id: String) -> FieldResult<bool> {
        let game_id = uuid::Uuid::parse_str(&game_id)?;
        handlers::games::delete_game(context, game_id).await
    }

    async fn admin_create_team(
        context: &Context,
        leader_phone: String,
        member_phones: Vec<String>,
        game_id: String,
        team_name: String,
    ) -> FieldResult<Team> {
        let game_id = uuid::Uuid::parse_str(&game_id)?;
        handlers::admin::create_team_with_members(
            context,
            leader_phone,
            member_phones,
            game_id,
            team_name,
        )
        .await
    }

    async fn admin_add_single(
        context: &Context,
        phone: String,
        game_id: String,
    ) -> FieldResult<bool> {
        let game_id = uuid::Uuid::parse_str(&game_id)?;
        handlers::admin::add_single_participant(context, phone, game_id).await
    }

    async fn admin_add_team_member(
        context: &Context,
        team_code: String,
        phone: String,
    ) -> FieldResult<Team> {
        handlers::admin::add_team_member(context, team_code, phone).await
    }

    async fn provision_participant(
        context: &Context,
        phone: String,
        display_name: String,
        class_section: Option<String>,
        password: String,
        admin: bool,
    ) -> FieldResult<User> {
        handlers::admin::provision_participant(
            context,
            phone,
            display_name,
            class_section,
            password,
            admin,
        )
        .await
    }

    async fn edit_participant(
        context: &Context,
        user_id: String,
        display_name: Option<String>,
        class_section: Option<String>,
        password: Option<String>,
    ) -> FieldResult<bool> {
        let user_id = uuid::Uuid::parse_str(&user_id)?;
        handlers::admin::edit_participant(context, user_id, display_name, class_section, password)
            .await
    }

    async fn remove_participant(context: &Context, user_id: String) -> FieldResult<bool> {
        let user_id = uuid::Uuid::parse_str(&user_id)?;
        handlers::admin::remove_participant(context, user_id).await
    }

    async fn delete_participant(context: &Context, user_id: String) -> FieldResult<bool> {
        let user_id = uuid::Uuid::parse_str(&user_id)?;
        handlers::admin::delete_participant(context, user_id).await
    }

    async fn delete_team(context: &Context, team_id: String) -> FieldResult<bool> {
        let team_id = uuid::Uuid::parse_str(&team_id)?;
        handlers::admin::delete_team(context, team_id).await
    }

    async fn remove_all_participants(context: &Context) -> FieldResult<bool> {
        handlers::admin::remove_all_participants(context).await
    }

    async fn clear_event(context: &Context) -> FieldResult<bool> {
        handlers::admin::clear_event(context).await
    }

    async fn add_whitelist_phone(context: &Context, phone: String) -> FieldResult<bool> {
        handlers::admin::add_whitelist_phone(context, phone).await
    }

    async fn add_whitelist_phones(context: &Context, phones: String) -> FieldResult<i32> {
        handlers::admin::add_whitelist_phones(context, phones).await
    }

    async fn remove_whitelist_phone(context: &Context, phone: String) -> FieldResult<bool> {
        handlers::admin::remove_whitelist_phone(context, phone).await
    }

    async fn update_certificate_settings(
        context: &Context,
        certificates_enabled: bool,
        event_name: String,
        event_date: String,
    ) -> FieldResult<crate::db::models::CertificateSettings> {
        handlers::certificates::update_certificate_settings(
            context,
            certificates_enabled,
            event_name,
            event_date,
        )
        .await
    }
}
