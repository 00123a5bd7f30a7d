// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::time::Duration;

use diesel::prelude::*;
use juniper::GraphQLObject;

use crate::{
    db::models::User,
    graphql::{
        Context,
        auth::{AuthJwtPayload, JwtPayload, RefreshJwtPayload, generate_jwt},
    },
};

use diesel_async::RunQueryDsl;

const ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(10 * 60);

#[derive(GraphQLObject)]
pub struct SessionCredentials {
    pub refresh_token: String,
    pub access_token: String,
}

fn ip_net(ip: &std::net::IpAddr) -> ipnet::IpNet {
    match ip {
        // These prefix lengths are the full address width, so new() cannot fail
        std::net::IpAddr::V4(_) => ipnet::IpNet::new(*ip, 32).unwrap(),
        std::net::IpAddr::V6(_) => ipnet::IpNet::new(*ip, 128).unwrap(),
    }
}

fn access_token_for(user: &User, ctx: &Context) -> juniper::FieldResult<String> {
    let token = generate_jwt(
        &JwtPayload::new_with_duration(
            user.id,
            vec!["festreg".to_string()],
            AuthJwtPayload {
                role: user.role,
                phone: user.phone.clone(),
                display_name: user.display_name.clone(),
                team_id: user.team_id,
            },
            ACCESS_TOKEN_LIFETIME,
        ),
        ctx.get_signing_key(),
    )?;
    Ok(token)
}

pub async fn create_session(ctx: &Context, user: &User) -> juniper::FieldResult<SessionCredentials> {
    let session_token = uuid::Uuid::now_v7().to_string();
    let access_token = access_token_for(user, ctx)?;

    let session = diesel::insert_into(crate::db::schema::sessions::table)
        .values(crate::db::models::NewSession {
            expires_at: chrono::Utc::now() + chrono::Duration::days(7),
            user_agent: Some(ctx.get_user_agent().to_string()),
            ip_address: Some(ip_net(ctx.get_ip())),
            session_token: session_token.clone(),
            user_id: Some(user.id),
        })
        .get_result::<crate::db::models::Session>(&mut ctx.store().conn().await?)
        .await?;

    let refresh_token = generate_jwt(
        &JwtPayload::new_with_exp_ts(
            user.id,
            vec!["festreg-refresh".to_string()],
            RefreshJwtPayload {
                jti: session_token,
                session_id: session.id,
            },
            session.expires_at.timestamp() as usize,
        ),
        ctx.get_signing_key(),
    )?;

    Ok(SessionCredentials {
        access_token,
        refresh_token,
    })
}

pub async fn refresh_session(
    ctx: &Context,
    refresh_token: String,
) -> juniper::FieldResult<SessionCredentials> {
    let refresh_token = crate::graphql::auth::parse_and_validate_jwt::<RefreshJwtPayload>(
        &refresh_token,
        &ctx.get_signing_key().verifying_key(),
    )?;
    let (current_session, user) = {
        let mut con = ctx.store().conn().await?;
        crate::db::schema::sessions::table
            .filter(crate::db::schema::sessions::session_token.eq(&refresh_token.custom_fields.jti))
            .filter(crate::db::schema::sessions::id.eq(refresh_token.custom_fields.session_id))
            .filter(crate::db::schema::sessions::expires_at.gt(chrono::Utc::now()))
            .filter(crate::db::schema::sessions::user_id.eq(&refresh_token.sub))
            .inner_join(crate::db::schema::users::table.on(
                crate::db::schema::sessions::user_id.eq(crate::db::schema::users::id.nullable()),
            ))
            .select((
                crate::db::models::Session::as_select(),
                crate::db::models::User::as_select(),
            ))
            .first::<(crate::db::models::Session, crate::db::models::User)>(&mut con)
            .await?
    };
    let access_token = access_token_for(&user, ctx)?;
    let new_session_token = uuid::Uuid::now_v7();
    let mut con = ctx.store().conn().await?;
    let new_session = diesel::update(
        crate::db::schema::sessions::table
            .filter(crate::db::schema::sessions::id.eq(current_session.id)),
    )
    .set((
        crate::db::schema::sessions::session_token.eq(new_session_token.to_string()),
        crate::db::schema::sessions::expires_at.eq(chrono::Utc::now() + chrono::Duration::days(7)),
        crate::db::schema::sessions::user_agent.eq(Some(ctx.get_user_agent().to_string())),
        crate::db::schema::sessions::ip_address.eq(Some(ip_net(ctx.get_ip()))),
    ))
    .get_result::<crate::db::models::Session>(&mut con)
    .await?;
    let new_refresh_token = generate_jwt(
        &JwtPayload::new_with_exp_ts(
            refresh_token.sub,
            vec!["festreg-refresh".to_string()],
            RefreshJwtPayload {
                jti: new_session_token.to_string(),
                session_id: current_session.id,
            },
            new_session.expires_at.timestamp() as usize,
        ),
        ctx.get_signing_key(),
    )?;
    Ok(SessionCredentials {
        access_token,
        refresh_token: new_refresh_token,
    })
}

pub async fn end_session(ctx: &Context, refresh_token: String) -> juniper::FieldResult<bool> {
    let jwt_payload = crate::graphql::auth::parse_and_validate_jwt::<RefreshJwtPayload>(
        &refresh_token,
        &ctx.get_signing_key().verifying_key(),
    )?;
    let mut con = ctx.store().conn().await?;
    diesel::delete(
        crate::db::schema::sessions::table
            .filter(crate::db::schema::sessions::id.eq(jwt_payload.custom_fields.session_id))
            .filter(crate::db::schema::sessions::session_token.eq(&jwt_payload.custom_fields.jti))
            .filter(crate::db::schema::sessions::user_id.eq(&jwt_payload.sub)),
    )
    .execute(&mut con)
    .await?;
    Ok(true)
}
