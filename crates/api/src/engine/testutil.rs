// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use uuid::Uuid;

use crate::db::models::{Game, GameType, NewGame, NewUser, User, UserRole};
use crate::store::{MemStore, RegistrationStore};

pub async fn participant(store: &MemStore, phone: &str, name: &str) -> User {
    store
        .insert_user(NewUser {
            phone: phone.to_string(),
            display_name: name.to_string(),
            class_section: Some("10-A".to_string()),
            password_hash: "$argon2id$stub".to_string(),
            role: UserRole::Participant,
        })
        .await
        .expect("insert user")
}

pub async fn single_game(store: &MemStore, name: &str, slots: i32) -> Game {
    store
        .insert_game(NewGame {
            name: name.to_string(),
            description: String::new(),
            game_type: GameType::Single,
            slots,
            team_size: None,
        })
        .await
        .expect("insert game")
}

pub async fn team_game(store: &MemStore, name: &str, slots: i32, team_size: Option<i32>) -> Game {
    store
        .insert_game(NewGame {
            name: name.to_string(),
            description: String::new(),
            game_type: GameType::Team,
            slots,
            team_size,
        })
        .await
        .expect("insert game")
}

pub async fn reload(store: &MemStore, user_id: Uuid) -> User {
    store
        .user_by_id(user_id)
        .await
        .expect("load user")
        .expect("user exists")
}
