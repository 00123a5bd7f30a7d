// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::net::IpAddr;

use juniper::EmptySubscription;
pub use mutation::Mutation;
pub use query::Query;

use crate::db::models::UserRole;
use crate::store::PgStore;

pub mod auth;
mod handlers;
mod mutation;
mod query;

#[derive(Clone)]
pub struct BaseContext {
    pub store: PgStore,
    pub keypair: ed25519_dalek::SigningKey,
}

pub struct Context {
    base: BaseContext,
    ip: IpAddr,
    user_agent: String,
    pub user: Option<AuthenticatedUser>,
}

impl juniper::Context for Context {}

/// Claims of a validated access token; never loaded from the database.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub role: UserRole,
    pub phone: String,
    pub display_name: String,
    pub team_id: Option<uuid::Uuid>,
}

impl Context {
    pub fn new(
        base: BaseContext,
        ip: IpAddr,
        user_agent: String,
        user_details: Option<AuthenticatedUser>,
    ) -> Self {
        Self {
            base,
            ip,
            user_agent,
            user: user_details,
        }
    }

    pub fn store(&self) -> &PgStore {
        &self.base.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn require_authentication(&self) -> juniper::FieldResult<AuthenticatedUser> {
        if let Some(user) = &self.user {
            Ok(user.clone())
        } else {
            Err(juniper::FieldError::new(
                "Authentication required",
                juniper::Value::null(),
            ))
        }
    }

    pub fn require_admin(&self) -> juniper::FieldResult<AuthenticatedUser> {
        match &self.user {
            Some(user) if user.role == UserRole::Admin => Ok(user.clone()),
            _ => Err(juniper::FieldError::new(
                "Admin access required",
                juniper::Value::null(),
            )),
        }
    }

    pub fn is_self_or_admin(&self, user_id: uuid::Uuid) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.user_id == user_id || u.role == UserRole::Admin)
    }

    pub fn get_ip(&self) -> &IpAddr {
        &self.ip
    }

    pub fn get_user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn get_signing_key(&self) -> &ed25519_dalek::SigningKey {
        &self.base.keypair
    }
}

pub type Schema = juniper::RootNode<Query, Mutation, EmptySubscription<Context>>;
