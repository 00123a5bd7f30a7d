// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::graphql_object;

use super::Context;

pub struct Query;

#[graphql_object]
#[graphql(context = Context)]
impl Query {
    fn is_authenticated(context: &Context) -> bool {
        context.is_authenticated()
    }

    async fn games(context: &Context) -> juniper::FieldResult<Vec<crate::db::models::Game>> {
        crate::graphql::handlers::games::get_games(context).await
    }

    async fn game_by_id(
        context: &Context,
        game_id: String,
    ) -> juniper::FieldResult<Option<crate::db::models::Game>> {
        let game_id = uuid::Uuid::parse_str(&game_id)?;
        crate::graphql::handlers::games::get_game_by_id(context, game_id).await
    }

    async fn users(context: &Context) -> juniper::FieldResult<Vec<crate::db::models::User>> {
        crate::graphql::handlers::accounts::get_all_users(context).await
    }

    async fn me(context: &Context) -> juniper::FieldResult<Option<crate::db::models::User>> {
        crate::graphql::handlers::accounts::get_current_user(context).await
    }

    async fn user_by_id(
        context: &Context,
        user_id: String,
    ) -> juniper::FieldResult<Option<crate::db::models::User>> {
        let user_id = uuid::Uuid::parse_str(&user_id)?;
        crate::graphql::handlers::accounts::get_user_by_id(context, user_id).await
    }

    async fn teams(context: &Context) -> juniper::FieldResult<Vec<crate::db::models::Team>> {
        crate::graphql::handlers::teams::get_teams(context).await
    }

    async fn opponents(
        context: &Context,
    ) -> juniper::FieldResult<crate::graphql::handlers::games::OpponentsView> {
        crate::graphql::handlers::games::get_opponents(context).await
    }

    async fn whitelist(context: &Context) -> juniper::FieldResult<Vec<String>> {
        crate::graphql::handlers::admin::get_whitelist(context).await
    }

    async fn certificate(
        context: &Context,
        user_id: String,
    ) -> juniper::FieldResult<crate::graphql::handlers::certificates::Certificate> {
        let user_id = uuid::Uuid::parse_str(&user_id)?;
        crate::graphql::handlers::certificates::get_certificate(context, user_id).await
    }

    async fn certificate_settings(
        context: &Context,
    ) -> juniper::FieldResult<crate::db::models::CertificateSettings> {
        crate::graphql::handlers::certificates::get_certificate_settings(context).await
    }
}
