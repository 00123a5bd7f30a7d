// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{FieldResult, GraphQLObject, graphql_object};

use crate::db::models::CertificateSettings;
use crate::engine::certificates;
use crate::graphql::Context;
use crate::store::RegistrationStore;

#[derive(GraphQLObject)]
pub struct Certificate {
    pub participant_name: String,
    pub class_section: Option<String>,
    pub game_name: String,
    pub team_name: Option<String>,
    pub event_name: String,
    /// ISO 8601 calendar date.
    pub event_date: String,
}

pub async fn get_certificate(context: &Context, user_id: uuid::Uuid) -> FieldResult<Certificate> {
    if !context.is_self_or_admin(user_id) {
        return Err(juniper::FieldError::new(
            "Permission denied to view this certificate",
            juniper::Value::null(),
        ));
    }
    let snapshot = certificates::certificate_snapshot(context.store(), user_id).await?;
    Ok(Certificate {
        participant_name: snapshot.participant_name,
        class_section: snapshot.class_section,
        game_name: snapshot.game_name,
        team_name: snapshot.team_name,
        event_name: snapshot.event_name,
        event_date: snapshot.event_date.format("%Y-%m-%d").to_string(),
    })
}

pub async fn get_certificate_settings(context: &Context) -> FieldResult<CertificateSettings> {
    Ok(context.store().certificate_settings().await?)
}

pub async fn update_certificate_settings(
    context: &Context,
    certificates_enabled: bool,
    event_name: String,
    event_date: String,
) -> FieldResult<CertificateSettings> {
    context.require_admin()?;
    let event_date = chrono::NaiveDate::parse_from_str(&event_date, "%Y-%m-%d")
        .map_err(|_| juniper::FieldError::new("Invalid event date", juniper::Value::null()))?;
    let settings = context
        .store()
        .update_certificate_settings(certificates_enabled, event_name, event_date)
        .await?;
    tracing::info!(
        enabled = settings.certificates_enabled,
        "certificate settings updated"
    );
    Ok(settings)
}

#[graphql_object]
#[graphql(context = Context)]
impl CertificateSettings {
    pub fn certificates_enabled(&self) -> bool {
        self.certificates_enabled
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn event_date(&self) -> String {
        self.event_date.format("%Y-%m-%d").to_string()
    }
}
