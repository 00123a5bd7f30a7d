// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::FieldResult;

use crate::db::models::{NewUser, Team, UserRole};
use crate::engine::{accounts, registration, roster};
use crate::graphql::Context;
use crate::graphql::handlers::accounts::hash_password;
use crate::store::{RegistrationStore, UserProfileChanges};

pub async fn create_team_with_members(
    context: &Context,
    leader_phone: String,
    member_phones: Vec<String>,
    game_id: uuid::Uuid,
    team_name: String,
) -> FieldResult<Team> {
    context.require_admin()?;
    let team = registration::admin_create_team_with_members(
        context.store(),
        leader_phone.trim(),
        &member_phones
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>(),
        game_id,
        team_name.trim(),
    )
    .await?;
    tracing::info!(team_id = %team.id, "admin created team");
    Ok(team)
}

pub async fn add_single_participant(
    context: &Context,
    phone: String,
    game_id: uuid::Uuid,
) -> FieldResult<bool> {
    context.require_admin()?;
    registration::admin_add_single(context.store(), phone.trim(), game_id).await?;
    Ok(true)
}

pub async fn add_team_member(
    context: &Context,
    team_code: String,
    phone: String,
) -> FieldResult<Team> {
    context.require_admin()?;
    let team =
        registration::admin_add_team_member(context.store(), &team_code, phone.trim()).await?;
    Ok(team)
}

pub async fn provision_participant(
    context: &Context,
    phone: String,
    display_name: String,
    class_section: Option<String>,
    password: String,
    admin: bool,
) -> FieldResult<crate::db::models::User> {
    context.require_admin()?;
    let user = accounts::provision_user(
        context.store(),
        NewUser {
            phone: phone.trim().to_string(),
            display_name,
            class_section,
            password_hash: hash_password(&password)?,
            role: if admin {
                UserRole::Admin
            } else {
                UserRole::Participant
            },
        },
    )
    .await?;
    tracing::info!(user_id = %user.id, "admin provisioned user");
    Ok(user)
}

pub async fn edit_participant(
    context: &Context,
    user_id: uuid::Uuid,
    display_name: Option<String>,
    class_section: Option<String>,
    password: Option<String>,
) -> FieldResult<bool> {
    context.require_admin()?;
    let password_hash = match password {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };
    accounts::update_profile(
        context.store(),
        user_id,
        UserProfileChanges {
            display_name,
            class_section,
            password_hash,
        },
    )
    .await?;
    Ok(true)
}

/// Take a participant out of their game (dissolving their team if they
/// lead one); the account itself stays.
pub async fn remove_participant(context: &Context, user_id: uuid::Uuid) -> FieldResult<bool> {
    context.require_admin()?;
    roster::remove_user(context.store(), user_id).await?;
    tracing::info!(%user_id, "participant removed from game");
    Ok(true)
}

/// Unregister and delete the account entirely.
pub async fn delete_participant(context: &Context, user_id: uuid::Uuid) -> FieldResult<bool> {
    context.require_admin()?;
    roster::delete_user(context.store(), user_id).await?;
    tracing::info!(%user_id, "participant deleted");
    Ok(true)
}

pub async fn delete_team(context: &Context, team_id: uuid::Uuid) -> FieldResult<bool> {
    context.require_admin()?;
    roster::delete_team(context.store(), team_id).await?;
    tracing::info!(%team_id, "team deleted");
    Ok(true)
}

/// Drop all participants and teams; games, whitelist and admin accounts
/// survive.
pub async fn remove_all_participants(context: &Context) -> FieldResult<bool> {
    context.require_admin()?;
    roster::remove_all_participants(context.store()).await?;
    tracing::warn!("all participants removed");
    Ok(true)
}

/// Full reset of the event; only admin accounts survive.
pub async fn clear_event(context: &Context) -> FieldResult<bool> {
    context.require_admin()?;
    roster::clear_event(context.store()).await?;
    tracing::warn!("event data cleared");
    Ok(true)
}

pub async fn get_whitelist(context: &Context) -> FieldResult<Vec<String>> {
    context.require_admin()?;
    let entries = context.store().list_whitelist().await?;
    Ok(entries.into_iter().map(|e| e.phone).collect())
}

pub async fn add_whitelist_phone(context: &Context, phone: String) -> FieldResult<bool> {
    context.require_admin()?;
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(juniper::FieldError::new(
            "Phone number must not be empty",
            juniper::Value::null(),
        ));
    }
    Ok(context.store().add_whitelist_phone(phone).await?)
}

/// Bulk import, comma or newline separated. Returns the number of
/// phones that were actually new.
pub async fn add_whitelist_phones(context: &Context, phones: String) -> FieldResult<i32> {
    context.require_admin()?;
    let added = accounts::whitelist_phones(context.store(), &phones).await?;
    tracing::info!(added, "whitelist bulk import");
    Ok(added as i32)
}

pub async fn remove_whitelist_phone(context: &Context, phone: String) -> FieldResult<bool> {
    context.require_admin()?;
    Ok(context.store().remove_whitelist_phone(phone.trim()).await?)
}
