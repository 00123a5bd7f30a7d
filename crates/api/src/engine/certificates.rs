// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::NaiveDate;
use uuid::Uuid;

use crate::engine::RegistrationError;
use crate::store::RegistrationStore;

/// Read-only projection handed to the document renderer. The engine
/// never renders anything itself.
#[derive(Debug, Clone)]
pub struct CertificateSnapshot {
    pub participant_name: String,
    pub class_section: Option<String>,
    pub game_name: String,
    pub team_name: Option<String>,
    pub event_name: String,
    pub event_date: NaiveDate,
}

/// Collect everything a participation certificate needs. Requires
/// certificates to be enabled and the user to be registered.
pub async fn certificate_snapshot<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
) -> Result<CertificateSnapshot, RegistrationError> {
    let settings = store.certificate_settings().await?;
    if !settings.certificates_enabled {
        return Err(RegistrationError::CertificatesDisabled);
    }
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    let game_id = user.game_id.ok_or(RegistrationError::NotRegistered)?;
    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    let team_name = match user.team_id {
        Some(team_id) => store.team_by_id(team_id).await?.map(|t| t.name),
        None => None,
    };
    Ok(CertificateSnapshot {
        participant_name: user.display_name,
        class_section: user.class_section,
        game_name: game.name,
        team_name,
        event_name: settings.event_name,
        event_date: settings.event_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registration::{create_team, register_single};
    use crate::engine::testutil::{participant, single_game, team_game};
    use crate::store::MemStore;

    #[tokio::test]
    async fn snapshot_requires_enabled_certificates_and_a_registration() {
        let store = MemStore::new();
        let game = single_game(&store, "Chess", 2).await;
        let user = participant(&store, "9000000001", "Asha").await;

        let err = certificate_snapshot(&store, user.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::CertificatesDisabled));

        store
            .update_certificate_settings(
                true,
                "Spring Fest".to_string(),
                NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            )
            .await
            .unwrap();

        let err = certificate_snapshot(&store, user.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::NotRegistered));

        register_single(&store, user.id, game.id).await.unwrap();
        let snapshot = certificate_snapshot(&store, user.id).await.unwrap();
        assert_eq!(snapshot.participant_name, "Asha");
        assert_eq!(snapshot.game_name, "Chess");
        assert_eq!(snapshot.event_name, "Spring Fest");
        assert!(snapshot.team_name.is_none());
    }

    #[tokio::test]
    async fn snapshot_names_the_team_for_team_entrants() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, None).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        create_team(&store, leader.id, game.id, "Quizzards")
            .await
            .unwrap();
        store
            .update_certificate_settings(
                true,
                "Spring Fest".to_string(),
                NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            )
            .await
            .unwrap();

        let snapshot = certificate_snapshot(&store, leader.id).await.unwrap();
        assert_eq!(snapshot.team_name.as_deref(), Some("Quizzards"));
        assert_eq!(snapshot.game_name, "Quiz");
    }
}
