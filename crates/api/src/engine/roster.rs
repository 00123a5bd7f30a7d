// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use uuid::Uuid;

use crate::engine::RegistrationError;
use crate::store::RegistrationStore;

/// Take a user out of whatever they are registered for. Removing a team
/// leader dissolves the whole team: every member is unassigned and the
/// team and its membership rows are deleted. Calling this twice is a
/// no-op the second time.
pub async fn remove_user<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
) -> Result<(), RegistrationError> {
    store
        .user_by_id(user_id)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    if let Some(team) = store.team_by_leader(user_id).await? {
        store.dissolve_team(team.id).await?;
    } else {
        store.release_user(user_id).await?;
    }
    Ok(())
}

/// Remove a user from their registration and delete the account row.
pub async fn delete_user<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
) -> Result<(), RegistrationError> {
    remove_user(store, user_id).await?;
    store.delete_user_row(user_id).await?;
    Ok(())
}

/// Dissolve a team by id (admin action).
pub async fn delete_team<S: RegistrationStore>(
    store: &S,
    team_id: Uuid,
) -> Result<(), RegistrationError> {
    if !store.dissolve_team(team_id).await? {
        return Err(RegistrationError::TeamNotFound);
    }
    Ok(())
}

/// Delete a game: unassign every entrant, drop its teams and their
/// membership rows, then the game itself.
pub async fn delete_game<S: RegistrationStore>(
    store: &S,
    game_id: Uuid,
) -> Result<(), RegistrationError> {
    if !store.delete_game_cascade(game_id).await? {
        return Err(RegistrationError::GameNotFound);
    }
    Ok(())
}

/// Remove every participant account; admins, games and the whitelist stay.
pub async fn remove_all_participants<S: RegistrationStore>(
    store: &S,
) -> Result<(), RegistrationError> {
    store.clear_participants().await?;
    Ok(())
}

/// Full event reset: everything except admin accounts.
pub async fn clear_event<S: RegistrationStore>(store: &S) -> Result<(), RegistrationError> {
    store.clear_event().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registration::{create_team, join_team_by_code, register_single};
    use crate::engine::testutil::{participant, reload, single_game, team_game};
    use crate::store::MemStore;

    #[tokio::test]
    async fn removing_a_leader_dissolves_the_team() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, Some(3)).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        let m1 = participant(&store, "9000000002", "Bilal").await;
        let m2 = participant(&store, "9000000003", "Chitra").await;
        let m3 = participant(&store, "9000000004", "Dev").await;

        let team = create_team(&store, leader.id, game.id, "Quizzards")
            .await
            .unwrap();
        join_team_by_code(&store, m1.id, &team.team_code)
            .await
            .unwrap();
        join_team_by_code(&store, m2.id, &team.team_code)
            .await
            .unwrap();

        remove_user(&store, leader.id).await.unwrap();

        for uid in [leader.id, m1.id, m2.id] {
            let user = reload(&store, uid).await;
            assert!(user.game_id.is_none());
            assert!(user.team_id.is_none());
        }
        assert!(store.team_by_id(team.id).await.unwrap().is_none());
        assert_eq!(store.membership_count(team.id).await.unwrap(), 0);

        // The code no longer resolves once the team is gone.
        let err = join_team_by_code(&store, m3.id, &team.team_code)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::TeamNotFound));
    }

    #[tokio::test]
    async fn removing_a_member_keeps_the_team() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, Some(3)).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        let member = participant(&store, "9000000002", "Bilal").await;

        let team = create_team(&store, leader.id, game.id, "Quizzards")
            .await
            .unwrap();
        join_team_by_code(&store, member.id, &team.team_code)
            .await
            .unwrap();

        remove_user(&store, member.id).await.unwrap();

        assert!(reload(&store, member.id).await.game_id.is_none());
        let leader = reload(&store, leader.id).await;
        assert_eq!(leader.team_id, Some(team.id));
        assert_eq!(store.membership_count(team.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn remove_user_is_idempotent() {
        let store = MemStore::new();
        let game = single_game(&store, "Chess", 2).await;
        let user = participant(&store, "9000000001", "Asha").await;
        register_single(&store, user.id, game.id).await.unwrap();

        remove_user(&store, user.id).await.unwrap();
        let after_first = reload(&store, user.id).await;
        remove_user(&store, user.id).await.unwrap();
        let after_second = reload(&store, user.id).await;

        assert!(after_first.game_id.is_none());
        assert_eq!(after_first.game_id, after_second.game_id);
        assert_eq!(after_first.team_id, after_second.team_id);
        // The freed slot is reusable.
        register_single(&store, user.id, game.id).await.unwrap();
    }

    #[tokio::test]
    async fn deleting_a_game_releases_everyone() {
        let store = MemStore::new();
        let chess = single_game(&store, "Chess", 4).await;
        let quiz = team_game(&store, "Quiz", 2, Some(3)).await;
        let solo = participant(&store, "9000000001", "Asha").await;
        let leader = participant(&store, "9000000002", "Bilal").await;
        let member = participant(&store, "9000000003", "Chitra").await;

        register_single(&store, solo.id, chess.id).await.unwrap();
        let team = create_team(&store, leader.id, quiz.id, "Quizzards")
            .await
            .unwrap();
        join_team_by_code(&store, member.id, &team.team_code)
            .await
            .unwrap();

        delete_game(&store, quiz.id).await.unwrap();

        assert!(store.game_by_id(quiz.id).await.unwrap().is_none());
        assert!(store.team_by_id(team.id).await.unwrap().is_none());
        for uid in [leader.id, member.id] {
            assert!(reload(&store, uid).await.game_id.is_none());
        }
        // The other game is untouched.
        assert_eq!(reload(&store, solo.id).await.game_id, Some(chess.id));

        let err = delete_game(&store, quiz.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::GameNotFound));
    }

    #[tokio::test]
    async fn delete_user_unregisters_before_dropping_the_row() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, None).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        let member = participant(&store, "9000000002", "Bilal").await;

        let team = create_team(&store, leader.id, game.id, "Quizzards")
            .await
            .unwrap();
        join_team_by_code(&store, member.id, &team.team_code)
            .await
            .unwrap();

        delete_user(&store, leader.id).await.unwrap();

        assert!(store.user_by_id(leader.id).await.unwrap().is_none());
        assert!(store.team_by_id(team.id).await.unwrap().is_none());
        assert!(reload(&store, member.id).await.game_id.is_none());
    }

    #[tokio::test]
    async fn delete_team_reopens_a_slot() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, None).await;
        let leader1 = participant(&store, "9000000001", "Asha").await;
        let leader2 = participant(&store, "9000000002", "Bilal").await;

        let team = create_team(&store, leader1.id, game.id, "First")
            .await
            .unwrap();
        delete_team(&store, team.id).await.unwrap();

        create_team(&store, leader2.id, game.id, "Second")
            .await
            .unwrap();

        let err = delete_team(&store, team.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::TeamNotFound));
    }
}
