// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use argon2::{
    Argon2, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};
use juniper::{FieldResult, graphql_object};
use rand_core::OsRng;

use crate::db::models::{User, UserRole};
use crate::engine::accounts::{self, Signup};
use crate::graphql::Context;
use crate::graphql::handlers::sessions::{self, SessionCredentials};
use crate::store::RegistrationStore;

pub fn hash_password(password: &str) -> FieldResult<String> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

pub async fn sign_up(
    context: &Context,
    phone: String,
    display_name: String,
    class_section: Option<String>,
    password: String,
) -> FieldResult<User> {
    let user = accounts::sign_up(
        context.store(),
        Signup {
            phone,
            display_name,
            class_section,
            password_hash: hash_password(&password)?,
        },
    )
    .await?;
    tracing::info!(user_id = %user.id, "new signup");
    Ok(user)
}

pub async fn login(
    context: &Context,
    phone: String,
    password: String,
) -> FieldResult<SessionCredentials> {
    let user = context.store().user_by_phone(&phone).await?;
    match user {
        Some(user) => {
            let parsed_hash = argon2::PasswordHash::new(&user.password_hash)?;
            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
            {
                sessions::create_session(context, &user).await
            } else {
                Err(juniper::FieldError::new(
                    "Invalid phone or password",
                    juniper::Value::null(),
                ))
            }
        }
        None => Err(juniper::FieldError::new(
            "Invalid phone or password",
            juniper::Value::null(),
        )),
    }
}

pub async fn get_current_user(context: &Context) -> FieldResult<Option<User>> {
    let Some(auth) = &context.user else {
        return Ok(None);
    };
    Ok(context.store().user_by_id(auth.user_id).await?)
}

pub async fn get_all_users(context: &Context) -> FieldResult<Vec<User>> {
    context.require_admin()?;
    Ok(context.store().list_users().await?)
}

pub async fn get_user_by_id(context: &Context, user_id: uuid::Uuid) -> FieldResult<Option<User>> {
    context.require_admin()?;
    Ok(context.store().user_by_id(user_id).await?)
}

#[graphql_object]
#[graphql(context = Context)]
impl User {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn phone(&self, ctx: &Context) -> FieldResult<String> {
        if ctx.is_self_or_admin(self.id) {
            Ok(self.phone.clone())
        } else {
            Err(juniper::FieldError::new(
                "Permission denied to view phone number",
                juniper::Value::null(),
            ))
        }
    }

    pub fn class_section(&self) -> Option<&str> {
        self.class_section.as_deref()
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub async fn game(&self, ctx: &Context) -> FieldResult<Option<crate::db::models::Game>> {
        match self.game_id {
            Some(game_id) => Ok(ctx.store().game_by_id(game_id).await?),
            None => Ok(None),
        }
    }

    pub async fn team(&self, ctx: &Context) -> FieldResult<Option<crate::db::models::Team>> {
        match self.team_id {
            Some(team_id) => Ok(ctx.store().team_by_id(team_id).await?),
            None => Ok(None),
        }
    }
}
