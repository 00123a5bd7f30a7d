// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::models::{
    CertificateSettings, Game, NewGame, NewTeam, NewTeamMember, NewUser, Team, TeamMember, User,
    UserRole, WhitelistPhone,
};
use crate::store::{RegistrationStore, StoreError, StoreResult, UserProfileChanges};

/// In-memory adapter. One mutex guards all tables, so every operation,
/// including the multi-row cascades, is trivially atomic.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    users: HashMap<Uuid, User>,
    games: HashMap<Uuid, Game>,
    teams: HashMap<Uuid, Team>,
    members: Vec<TeamMember>,
    whitelist: Vec<WhitelistPhone>,
    settings: CertificateSettings,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            games: HashMap::new(),
            teams: HashMap::new(),
            members: Vec::new(),
            whitelist: Vec::new(),
            settings: CertificateSettings {
                id: Uuid::now_v7(),
                certificates_enabled: false,
                event_name: "Annual Fest".to_string(),
                event_date: chrono::Utc::now().date_naive(),
            },
        }
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning only happens if a holder panicked; propagate that.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn occupied_singles(&self, game_id: Uuid) -> i64 {
        self.users
            .values()
            .filter(|u| u.game_id == Some(game_id) && u.team_id.is_none())
            .count() as i64
    }

    fn occupied_teams(&self, game_id: Uuid) -> i64 {
        self.teams.values().filter(|t| t.game_id == game_id).count() as i64
    }

    fn members_of(&self, team_id: Uuid) -> i64 {
        self.members.iter().filter(|m| m.team_id == team_id).count() as i64
    }

    fn assign(&mut self, user_id: Uuid, game_id: Uuid, team_id: Option<Uuid>) -> bool {
        match self.users.get_mut(&user_id) {
            Some(user) if user.game_id.is_none() => {
                user.game_id = Some(game_id);
                user.team_id = team_id;
                user.updated_at = chrono::Utc::now();
                true
            }
            _ => false,
        }
    }

    fn unassign(&mut self, user_id: Uuid) {
        self.members.retain(|m| m.user_id != user_id);
        if let Some(user) = self.users.get_mut(&user_id) {
            user.game_id = None;
            user.team_id = None;
            user.updated_at = chrono::Utc::now();
        }
    }

    fn insert_team_row(&mut self, new_team: NewTeam) -> Team {
        let team = Team {
            id: Uuid::now_v7(),
            name: new_team.name,
            game_id: new_team.game_id,
            leader_user_id: new_team.leader_user_id,
            team_code: new_team.team_code,
            created_at: chrono::Utc::now(),
        };
        self.teams.insert(team.id, team.clone());
        team
    }

    fn insert_member_row(&mut self, new_member: NewTeamMember) {
        self.members.push(TeamMember {
            id: Uuid::now_v7(),
            team_id: new_member.team_id,
            user_id: new_member.user_id,
            joined_at: chrono::Utc::now(),
        });
    }

    fn drop_team(&mut self, team_id: Uuid) {
        let affected: Vec<Uuid> = self
            .users
            .values()
            .filter(|u| u.team_id == Some(team_id))
            .map(|u| u.id)
            .collect();
        for user_id in affected {
            self.unassign(user_id);
        }
        self.members.retain(|m| m.team_id != team_id);
        self.teams.remove(&team_id);
    }
}

#[async_trait::async_trait]
impl RegistrationStore for MemStore {
    async fn user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn user_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.values().find(|u| u.phone == phone).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut rows: Vec<User> = self.lock().users.values().cloned().collect();
        rows.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(rows)
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.phone == new_user.phone) {
            return Err(StoreError::Conflict);
        }
        let now = chrono::Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            phone: new_user.phone,
            display_name: new_user.display_name,
            class_section: new_user.class_section,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: now,
            updated_at: now,
            game_id: None,
            team_id: None,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let Some(user) = inner.users.get_mut(&user_id) else {
            return Ok(false);
        };
        if let Some(display_name) = changes.display_name {
            user.display_name = display_name;
        }
        if let Some(class_section) = changes.class_section {
            user.class_section = Some(class_section);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = chrono::Utc::now();
        Ok(true)
    }

    async fn delete_user_row(&self, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.lock().users.remove(&user_id).is_some())
    }

    async fn game_by_id(&self, game_id: Uuid) -> StoreResult<Option<Game>> {
        Ok(self.lock().games.get(&game_id).cloned())
    }

    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let mut rows: Vec<Game> = self.lock().games.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn insert_game(&self, new_game: NewGame) -> StoreResult<Game> {
        let game = Game {
            id: Uuid::now_v7(),
            name: new_game.name,
            description: new_game.description,
            game_type: new_game.game_type,
            slots: new_game.slots,
            team_size: new_game.team_size,
            created_at: chrono::Utc::now(),
        };
        self.lock().games.insert(game.id, game.clone());
        Ok(game)
    }

    async fn occupied_single_slots(&self, game_id: Uuid) -> StoreResult<i64> {
        Ok(self.lock().occupied_singles(game_id))
    }

    async fn occupied_team_slots(&self, game_id: Uuid) -> StoreResult<i64> {
        Ok(self.lock().occupied_teams(game_id))
    }

    async fn single_entrants(&self, game_id: Uuid) -> StoreResult<Vec<User>> {
        let mut rows: Vec<User> = self
            .lock()
            .users
            .values()
            .filter(|u| u.game_id == Some(game_id) && u.team_id.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(rows)
    }

    async fn team_by_id(&self, team_id: Uuid) -> StoreResult<Option<Team>> {
        Ok(self.lock().teams.get(&team_id).cloned())
    }

    async fn team_by_code(&self, team_code: &str) -> StoreResult<Option<Team>> {
        Ok(self
            .lock()
            .teams
            .values()
            .find(|t| t.team_code == team_code)
            .cloned())
    }

    async fn team_by_leader(&self, leader_user_id: Uuid) -> StoreResult<Option<Team>> {
        Ok(self
            .lock()
            .teams
            .values()
            .find(|t| t.leader_user_id == leader_user_id)
            .cloned())
    }

    async fn teams_of_game(&self, game_id: Uuid) -> StoreResult<Vec<Team>> {
        let mut rows: Vec<Team> = self
            .lock()
            .teams
            .values()
            .filter(|t| t.game_id == game_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let mut rows: Vec<Team> = self.lock().teams.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn team_code_exists(&self, team_code: &str) -> StoreResult<bool> {
        Ok(self.lock().teams.values().any(|t| t.team_code == team_code))
    }

    async fn membership_count(&self, team_id: Uuid) -> StoreResult<i64> {
        Ok(self.lock().members_of(team_id))
    }

    async fn team_member_users(&self, team_id: Uuid) -> StoreResult<Vec<User>> {
        let inner = self.lock();
        let mut rows: Vec<User> = inner
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .filter_map(|m| inner.users.get(&m.user_id).cloned())
            .collect();
        rows.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(rows)
    }

    async fn assign_single(&self, user_id: Uuid, game_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.lock();
        let Some(game) = inner.games.get(&game_id).cloned() else {
            return Ok(false);
        };
        if inner.occupied_singles(game_id) >= i64::from(game.slots) {
            return Ok(false);
        }
        Ok(inner.assign(user_id, game_id, None))
    }

    async fn create_team_with_leader(&self, new_team: NewTeam) -> StoreResult<Option<Team>> {
        let mut inner = self.lock();
        if inner
            .teams
            .values()
            .any(|t| t.team_code == new_team.team_code)
        {
            return Err(StoreError::Conflict);
        }
        let Some(game) = inner.games.get(&new_team.game_id).cloned() else {
            return Ok(None);
        };
        if inner.occupied_teams(game.id) >= i64::from(game.slots) {
            return Ok(None);
        }
        let leader_id = new_team.leader_user_id;
        let team = inner.insert_team_row(new_team);
        if !inner.assign(leader_id, team.game_id, Some(team.id)) {
            inner.teams.remove(&team.id);
            return Ok(None);
        }
        Ok(Some(team))
    }

    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.lock();
        let Some(team) = inner.teams.get(&team_id).cloned() else {
            return Ok(false);
        };
        let Some(game) = inner.games.get(&team.game_id).cloned() else {
            return Ok(false);
        };
        if let Some(team_size) = game.team_size {
            // +1 for the leader, who has no membership row.
            if inner.members_of(team_id) + 1 >= i64::from(team_size) {
                return Ok(false);
            }
        }
        if !inner.assign(user_id, team.game_id, Some(team.id)) {
            return Ok(false);
        }
        inner.insert_member_row(NewTeamMember { team_id, user_id });
        Ok(true)
    }

    async fn create_team_roster(
        &self,
        new_team: NewTeam,
        member_ids: &[Uuid],
    ) -> StoreResult<Option<Team>> {
        let mut inner = self.lock();
        if inner
            .teams
            .values()
            .any(|t| t.team_code == new_team.team_code)
        {
            return Err(StoreError::Conflict);
        }
        let Some(game) = inner.games.get(&new_team.game_id).cloned() else {
            return Ok(None);
        };
        if inner.occupied_teams(game.id) >= i64::from(game.slots) {
            return Ok(None);
        }
        let leader_id = new_team.leader_user_id;
        let everyone: Vec<Uuid> = std::iter::once(leader_id)
            .chain(member_ids.iter().copied())
            .collect();
        if everyone
            .iter()
            .any(|id| inner.users.get(id).is_none_or(|u| u.game_id.is_some()))
        {
            return Ok(None);
        }
        let team = inner.insert_team_row(new_team);
        for (idx, assignee) in everyone.iter().enumerate() {
            if idx > 0 {
                inner.insert_member_row(NewTeamMember {
                    team_id: team.id,
                    user_id: *assignee,
                });
            }
            inner.assign(*assignee, team.game_id, Some(team.id));
        }
        Ok(Some(team))
    }

    async fn release_user(&self, user_id: Uuid) -> StoreResult<()> {
        self.lock().unassign(user_id);
        Ok(())
    }

    async fn dissolve_team(&self, team_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.lock();
        if !inner.teams.contains_key(&team_id) {
            return Ok(false);
        }
        inner.drop_team(team_id);
        Ok(true)
    }

    async fn delete_game_cascade(&self, game_id: Uuid) -> StoreResult<bool> {
        let mut inner = self.lock();
        if inner.games.remove(&game_id).is_none() {
            return Ok(false);
        }
        let game_teams: Vec<Uuid> = inner
            .teams
            .values()
            .filter(|t| t.game_id == game_id)
            .map(|t| t.id)
            .collect();
        for team_id in game_teams {
            inner.drop_team(team_id);
        }
        let entrants: Vec<Uuid> = inner
            .users
            .values()
            .filter(|u| u.game_id == Some(game_id))
            .map(|u| u.id)
            .collect();
        for user_id in entrants {
            inner.unassign(user_id);
        }
        Ok(true)
    }

    async fn clear_participants(&self) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.members.clear();
        inner.teams.clear();
        for user in inner.users.values_mut() {
            user.game_id = None;
            user.team_id = None;
        }
        inner.users.retain(|_, u| u.role == UserRole::Admin);
        Ok(())
    }

    async fn clear_event(&self) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.members.clear();
        inner.teams.clear();
        for user in inner.users.values_mut() {
            user.game_id = None;
            user.team_id = None;
        }
        inner.users.retain(|_, u| u.role == UserRole::Admin);
        inner.games.clear();
        inner.whitelist.clear();
        Ok(())
    }

    async fn whitelist_contains(&self, phone: &str) -> StoreResult<bool> {
        Ok(self.lock().whitelist.iter().any(|w| w.phone == phone))
    }

    async fn list_whitelist(&self) -> StoreResult<Vec<WhitelistPhone>> {
        Ok(self.lock().whitelist.clone())
    }

    async fn add_whitelist_phone(&self, phone: &str) -> StoreResult<bool> {
        let mut inner = self.lock();
        if inner.whitelist.iter().any(|w| w.phone == phone) {
            return Ok(false);
        }
        inner.whitelist.push(WhitelistPhone {
            phone: phone.to_string(),
            added_at: chrono::Utc::now(),
        });
        Ok(true)
    }

    async fn remove_whitelist_phone(&self, phone: &str) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.whitelist.len();
        inner.whitelist.retain(|w| w.phone != phone);
        Ok(inner.whitelist.len() < before)
    }

    async fn certificate_settings(&self) -> StoreResult<CertificateSettings> {
        Ok(self.lock().settings.clone())
    }

    async fn update_certificate_settings(
        &self,
        certificates_enabled: bool,
        event_name: String,
        event_date: NaiveDate,
    ) -> StoreResult<CertificateSettings> {
        let mut inner = self.lock();
        inner.settings.certificates_enabled = certificates_enabled;
        inner.settings.event_name = event_name;
        inner.settings.event_date = event_date;
        Ok(inner.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{participant, team_game};

    fn team_named(game_id: Uuid, leader_user_id: Uuid, code: &str) -> NewTeam {
        NewTeam {
            name: "Quizzards".to_string(),
            game_id,
            leader_user_id,
            team_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn taken_team_codes_are_reported_as_conflicts() {
        let store = MemStore::new();
        let game = team_game(&store, "Quiz", 4, None).await;
        let leader1 = participant(&store, "9000000001", "Asha").await;
        let leader2 = participant(&store, "9000000002", "Bilal").await;
        let leader3 = participant(&store, "9000000003", "Chitra").await;

        store
            .create_team_with_leader(team_named(game.id, leader1.id, "AAAAAA"))
            .await
            .unwrap()
            .expect("first code is free");

        let err = store
            .create_team_with_leader(team_named(game.id, leader2.id, "AAAAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        let err = store
            .create_team_roster(team_named(game.id, leader3.id, "AAAAAA"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));

        // The refused leaders are still unregistered.
        let user = store.user_by_id(leader2.id).await.unwrap().unwrap();
        assert!(user.game_id.is_none());
    }
}
