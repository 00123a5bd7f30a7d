// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashSet;

use uuid::Uuid;

use crate::db::models::{Game, GameType, NewTeam, Team, User};
use crate::engine::{RegistrationError, codes};
use crate::store::{RegistrationStore, StoreError};

/// Free slots on a game, floored at zero. A slot is one seat for
/// single-type games and one team for team-type games.
pub async fn available_slots<S: RegistrationStore>(
    store: &S,
    game: &Game,
) -> Result<i32, RegistrationError> {
    let occupied = match game.game_type {
        GameType::Single => store.occupied_single_slots(game.id).await?,
        GameType::Team => store.occupied_team_slots(game.id).await?,
    };
    Ok((i64::from(game.slots) - occupied).max(0) as i32)
}

/// Register a user directly for a single-type game.
pub async fn register_single<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
    game_id: Uuid,
) -> Result<(), RegistrationError> {
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    if user.is_registered() {
        return Err(RegistrationError::AlreadyRegistered);
    }
    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    if game.game_type != GameType::Single {
        return Err(RegistrationError::InvalidGameType);
    }
    if available_slots(store, &game).await? <= 0 {
        return Err(RegistrationError::NoSlotsAvailable);
    }
    // The adapter re-checks capacity atomically; a lost race surfaces
    // here as a refused claim.
    if !store.assign_single(user_id, game_id).await? {
        return Err(RegistrationError::NoSlotsAvailable);
    }
    Ok(())
}

/// Form a team on a team-type game, registering the leader with it.
pub async fn create_team<S: RegistrationStore>(
    store: &S,
    leader_id: Uuid,
    game_id: Uuid,
    team_name: &str,
) -> Result<Team, RegistrationError> {
    let leader = store
        .user_by_id(leader_id)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    if leader.is_registered() {
        return Err(RegistrationError::AlreadyRegistered);
    }
    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    if game.game_type != GameType::Team {
        return Err(RegistrationError::InvalidGameType);
    }
    if available_slots(store, &game).await? <= 0 {
        return Err(RegistrationError::NoSlotsAvailable);
    }
    loop {
        let team_code = codes::generate_team_code(store).await?;
        let result = store
            .create_team_with_leader(NewTeam {
                name: team_name.to_string(),
                game_id,
                leader_user_id: leader_id,
                team_code,
            })
            .await;
        match result {
            Ok(Some(team)) => return Ok(team),
            Ok(None) => return Err(RegistrationError::NoSlotsAvailable),
            // Another team claimed this code between check and insert;
            // draw again.
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// What a registered participant may see of their competition: the
/// other direct entrants of a single game, or the rival teams of a
/// team game. The caller themselves (or their own team) is excluded.
#[derive(Debug)]
pub enum Opponents {
    Entrants(Vec<User>),
    Teams(Vec<Team>),
}

pub async fn opponents<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
) -> Result<Opponents, RegistrationError> {
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    let game_id = user.game_id.ok_or(RegistrationError::NotRegistered)?;
    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    match game.game_type {
        GameType::Single => {
            let entrants = store
                .single_entrants(game_id)
                .await?
                .into_iter()
                .filter(|u| u.id != user_id)
                .collect();
            Ok(Opponents::Entrants(entrants))
        }
        GameType::Team => {
            let teams = store
                .teams_of_game(game_id)
                .await?
                .into_iter()
                .filter(|t| Some(t.id) != user.team_id)
                .collect();
            Ok(Opponents::Teams(teams))
        }
    }
}

/// Join an existing team through its shareable code.
pub async fn join_team_by_code<S: RegistrationStore>(
    store: &S,
    user_id: Uuid,
    team_code: &str,
) -> Result<Team, RegistrationError> {
    let team_code = team_code.trim().to_uppercase();
    let team = store
        .team_by_code(&team_code)
        .await?
        .ok_or(RegistrationError::TeamNotFound)?;
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    if user.is_registered() {
        return Err(RegistrationError::AlreadyRegistered);
    }
    let game = store
        .game_by_id(team.game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    if let Some(team_size) = game.team_size {
        // Membership rows plus the leader.
        if store.membership_count(team.id).await? + 1 >= i64::from(team_size) {
            return Err(RegistrationError::TeamFull);
        }
    }
    if !store.add_team_member(team.id, user_id).await? {
        return Err(RegistrationError::TeamFull);
    }
    Ok(team)
}

/// Admin path: create a team with leader and members in one step.
/// Everyone is validated before any row is written; the roster insert
/// itself is a single atomic store operation. When `team_size` is
/// configured it is an upper bound on leader + members.
pub async fn admin_create_team_with_members<S: RegistrationStore>(
    store: &S,
    leader_phone: &str,
    member_phones: &[String],
    game_id: Uuid,
    team_name: &str,
) -> Result<Team, RegistrationError> {
    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    if game.game_type != GameType::Team {
        return Err(RegistrationError::InvalidGameType);
    }
    if let Some(team_size) = game.team_size {
        if 1 + member_phones.len() > team_size as usize {
            return Err(RegistrationError::TeamFull);
        }
    }
    let leader = lookup_unregistered(store, leader_phone).await?;
    let mut member_ids = Vec::with_capacity(member_phones.len());
    for phone in member_phones {
        member_ids.push(lookup_unregistered(store, phone).await?.id);
    }
    let mut seen: HashSet<Uuid> = HashSet::from([leader.id]);
    if !member_ids.iter().all(|id| seen.insert(*id)) {
        return Err(RegistrationError::AlreadyRegistered);
    }
    if available_slots(store, &game).await? <= 0 {
        return Err(RegistrationError::NoSlotsAvailable);
    }
    loop {
        let team_code = codes::generate_team_code(store).await?;
        let result = store
            .create_team_roster(
                NewTeam {
                    name: team_name.to_string(),
                    game_id,
                    leader_user_id: leader.id,
                    team_code,
                },
                &member_ids,
            )
            .await;
        match result {
            Ok(Some(team)) => return Ok(team),
            Ok(None) => return Err(RegistrationError::NoSlotsAvailable),
            Err(StoreError::Conflict) => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Admin path for single games: assign an existing user by phone.
pub async fn admin_add_single<S: RegistrationStore>(
    store: &S,
    phone: &str,
    game_id: Uuid,
) -> Result<(), RegistrationError> {
    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    if game.game_type != GameType::Single {
        return Err(RegistrationError::InvalidGameType);
    }
    let user = lookup_unregistered(store, phone).await?;
    if available_slots(store, &game).await? <= 0 {
        return Err(RegistrationError::NoSlotsAvailable);
    }
    if !store.assign_single(user.id, game_id).await? {
        return Err(RegistrationError::NoSlotsAvailable);
    }
    Ok(())
}

/// Admin path: add an existing user to a team by its code.
pub async fn admin_add_team_member<S: RegistrationStore>(
    store: &S,
    team_code: &str,
    phone: &str,
) -> Result<Team, RegistrationError> {
    let team_code = team_code.trim().to_uppercase();
    let team = store
        .team_by_code(&team_code)
        .await?
        .ok_or(RegistrationError::TeamNotFound)?;
    let member = lookup_unregistered(store, phone).await?;
    let game = store
        .game_by_id(team.game_id)
        .await?
        .ok_or(RegistrationError::GameNotFound)?;
    if let Some(team_size) = game.team_size {
        if store.membership_count(team.id).await? + 1 >= i64::from(team_size) {
            return Err(RegistrationError::TeamFull);
        }
    }
    if !store.add_team_member(team.id, member.id).await? {
        return Err(RegistrationError::TeamFull);
    }
    Ok(team)
}

async fn lookup_unregistered<S: RegistrationStore>(
    store: &S,
    phone: &str,
) -> Result<User, RegistrationError> {
    let user = store
        .user_by_phone(phone)
        .await?
        .ok_or(RegistrationError::UserNotFound)?;
    if user.is_registered() {
        return Err(RegistrationError::AlreadyRegistered);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::codes::TEAM_CODE_LEN;
    use crate::engine::testutil::{participant, reload, single_game, team_game};
    use crate::store::MemStore;

    #[tokio::test]
    async fn single_game_fills_up() {
        let store = MemStore::new();
        let game = single_game(&store, "Chess", 1).await;
        let u1 = participant(&store, "9000000001", "Asha").await;
        let u2 = participant(&store, "9000000002", "Bilal").await;

        register_single(&store, u1.id, game.id).await.unwrap();
        assert_eq!(reload(&store, u1.id).await.game_id, Some(game.id));

        let err = register_single(&store, u2.id, game.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::NoSlotsAvailable));
        assert_eq!(available_slots(&store, &game).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn double_registration_is_refused() {
        let store = MemStore::new();
        let chess = single_game(&store, "Chess", 4).await;
        let carrom = single_game(&store, "Carrom", 4).await;
        let user = participant(&store, "9000000001", "Asha").await;

        register_single(&store, user.id, chess.id).await.unwrap();
        let err = register_single(&store, user.id, carrom.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::AlreadyRegistered));
        // The first assignment must not have been overwritten.
        assert_eq!(reload(&store, user.id).await.game_id, Some(chess.id));
    }

    #[tokio::test]
    async fn single_registration_rejects_team_games() {
        let store = MemStore::new();
        let game = team_game(&store, "Cricket", 4, Some(11)).await;
        let user = participant(&store, "9000000001", "Asha").await;

        let err = register_single(&store, user.id, game.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidGameType));
        assert!(reload(&store, user.id).await.game_id.is_none());
    }

    #[tokio::test]
    async fn team_fills_to_team_size_including_leader() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, Some(3)).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        let m1 = participant(&store, "9000000002", "Bilal").await;
        let m2 = participant(&store, "9000000003", "Chitra").await;
        let m3 = participant(&store, "9000000004", "Dev").await;

        let team = create_team(&store, leader.id, game.id, "Quizzards")
            .await
            .unwrap();
        assert_eq!(team.team_code.len(), TEAM_CODE_LEN);

        join_team_by_code(&store, m1.id, &team.team_code)
            .await
            .unwrap();
        join_team_by_code(&store, m2.id, &team.team_code)
            .await
            .unwrap();
        let err = join_team_by_code(&store, m3.id, &team.team_code)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::TeamFull));

        // Leader and both members point at the same game and team.
        for uid in [leader.id, m1.id, m2.id] {
            let user = reload(&store, uid).await;
            assert_eq!(user.game_id, Some(game.id));
            assert_eq!(user.team_id, Some(team.id));
        }
        assert!(reload(&store, m3.id).await.game_id.is_none());
    }

    #[tokio::test]
    async fn team_slots_are_counted_in_teams_not_members() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 1, Some(3)).await;
        let leader1 = participant(&store, "9000000001", "Asha").await;
        let leader2 = participant(&store, "9000000002", "Bilal").await;

        create_team(&store, leader1.id, game.id, "First").await.unwrap();
        let err = create_team(&store, leader2.id, game.id, "Second")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NoSlotsAvailable));
    }

    #[tokio::test]
    async fn join_is_case_insensitive_and_reports_unknown_codes() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 2, None).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        let joiner = participant(&store, "9000000002", "Bilal").await;

        let team = create_team(&store, leader.id, game.id, "Quizzards")
            .await
            .unwrap();
        join_team_by_code(&store, joiner.id, &team.team_code.to_lowercase())
            .await
            .unwrap();

        let stranger = participant(&store, "9000000003", "Chitra").await;
        let err = join_team_by_code(&store, stranger.id, "ZZZZZZ")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::TeamNotFound));
    }

    #[tokio::test]
    async fn team_codes_are_unique_across_teams() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 16, None).await;
        let mut codes = std::collections::HashSet::new();
        for i in 0..16 {
            let leader =
                participant(&store, &format!("90000001{i:02}"), &format!("Leader {i}")).await;
            let team = create_team(&store, leader.id, game.id, &format!("Team {i}"))
                .await
                .unwrap();
            assert!(codes.insert(team.team_code));
        }
    }

    #[tokio::test]
    async fn admin_roster_respects_upper_bound_and_writes_nothing_on_failure() {
        let store = MemStore::new();
        let game = team_game(&store, "Cricket", 2, Some(3)).await;
        let leader = participant(&store, "9000000001", "Asha").await;
        participant(&store, "9000000002", "Bilal").await;
        participant(&store, "9000000003", "Chitra").await;
        participant(&store, "9000000004", "Dev").await;

        // Leader + 3 members exceeds team_size 3.
        let err = admin_create_team_with_members(
            &store,
            "9000000001",
            &[
                "9000000002".to_string(),
                "9000000003".to_string(),
                "9000000004".to_string(),
            ],
            game.id,
            "Strikers",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RegistrationError::TeamFull));
        assert!(reload(&store, leader.id).await.game_id.is_none());
        assert_eq!(available_slots(&store, &game).await.unwrap(), 2);

        let team = admin_create_team_with_members(
            &store,
            "9000000001",
            &["9000000002".to_string(), "9000000003".to_string()],
            game.id,
            "Strikers",
        )
        .await
        .unwrap();
        assert_eq!(
            store.membership_count(team.id).await.unwrap(),
            2,
            "leader has no membership row"
        );
    }

    #[tokio::test]
    async fn admin_roster_rejects_registered_members_before_writing() {
        let store = MemStore::new();
        let chess = single_game(&store, "Chess", 4).await;
        let game = team_game(&store, "Cricket", 2, Some(5)).await;
        participant(&store, "9000000001", "Asha").await;
        let busy = participant(&store, "9000000002", "Bilal").await;
        register_single(&store, busy.id, chess.id).await.unwrap();

        let err = admin_create_team_with_members(
            &store,
            "9000000001",
            &["9000000002".to_string()],
            game.id,
            "Strikers",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RegistrationError::AlreadyRegistered));
        assert_eq!(store.occupied_team_slots(game.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn opponents_show_fellow_entrants_and_rival_teams() {
        let store = MemStore::new();
        let chess = single_game(&store, "Chess", 4).await;
        let u1 = participant(&store, "9000000001", "Asha").await;
        let u2 = participant(&store, "9000000002", "Bilal").await;

        let err = opponents(&store, u1.id).await.unwrap_err();
        assert!(matches!(err, RegistrationError::NotRegistered));

        register_single(&store, u1.id, chess.id).await.unwrap();
        register_single(&store, u2.id, chess.id).await.unwrap();

        let Opponents::Entrants(entrants) = opponents(&store, u1.id).await.unwrap() else {
            panic!("single game lists entrants");
        };
        assert_eq!(entrants.len(), 1);
        assert_eq!(entrants[0].id, u2.id);

        let quiz = team_game(&store, "Quiz", 4, None).await;
        let leader1 = participant(&store, "9000000003", "Chitra").await;
        let leader2 = participant(&store, "9000000004", "Dev").await;
        create_team(&store, leader1.id, quiz.id, "First").await.unwrap();
        let rival = create_team(&store, leader2.id, quiz.id, "Second")
            .await
            .unwrap();

        let Opponents::Teams(teams) = opponents(&store, leader1.id).await.unwrap() else {
            panic!("team game lists teams");
        };
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].id, rival.id);
    }

    #[tokio::test]
    async fn admin_add_single_checks_phone_and_capacity() {
        let store = MemStore::new();
        let game = single_game(&store, "Chess", 1).await;
        participant(&store, "9000000001", "Asha").await;
        participant(&store, "9000000002", "Bilal").await;

        let err = admin_add_single(&store, "9999999999", game.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UserNotFound));

        admin_add_single(&store, "9000000001", game.id).await.unwrap();
        let err = admin_add_single(&store, "9000000002", game.id)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::NoSlotsAvailable));
    }
}
