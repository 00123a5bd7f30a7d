// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::models::{
    CertificateSettings, Game, NewGame, NewTeam, NewTeamMember, NewUser, Team, User,
    WhitelistPhone,
};
use crate::db::schema::{certificate_settings, games, team_members, teams, users, whitelist_phones};
use crate::store::{RegistrationStore, StoreError, StoreResult, UserProfileChanges};

pub type PgPool = diesel_async::pooled_connection::bb8::Pool<AsyncPgConnection>;

/// Postgres adapter. Conditional mutations run as serializable
/// transactions so the capacity check and the claiming write cannot be
/// interleaved with a concurrent registration.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn conn(
        &self,
    ) -> StoreResult<diesel_async::pooled_connection::bb8::PooledConnection<'_, AsyncPgConnection>>
    {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

/// Conditional transactions signal "precondition no longer holds" by
/// rolling back; everything else is a real database error.
fn rollback_as_false(result: Result<(), DieselError>) -> StoreResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(DieselError::RollbackTransaction) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn unassign_team_users(conn: &mut AsyncPgConnection, team_id: Uuid) -> QueryResult<()> {
    diesel::update(users::table.filter(users::team_id.eq(team_id)))
        .set((
            users::game_id.eq(None::<Uuid>),
            users::team_id.eq(None::<Uuid>),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(conn)
        .await?;
    diesel::delete(team_members::table.filter(team_members::team_id.eq(team_id)))
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl RegistrationStore for PgStore {
    async fn user_by_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let user = users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(user)
    }

    async fn user_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let user = users::table
            .filter(users::phone.eq(phone))
            .select(User::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = users::table
            .order(users::display_name.asc())
            .select(User::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn insert_user(&self, new_user: NewUser) -> StoreResult<User> {
        let result = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut self.conn().await?)
            .await;
        match result {
            Ok(user) => Ok(user),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        changes: UserProfileChanges,
    ) -> StoreResult<bool> {
        if changes.is_empty() {
            // Still report whether the user exists.
            return Ok(self.user_by_id(user_id).await?.is_some());
        }
        let updated = diesel::update(users::table.find(user_id))
            .set((
                &ProfileChangeset::from(changes),
                users::updated_at.eq(chrono::Utc::now()),
            ))
            .execute(&mut self.conn().await?)
            .await?;
        Ok(updated == 1)
    }

    async fn delete_user_row(&self, user_id: Uuid) -> StoreResult<bool> {
        let deleted = diesel::delete(users::table.find(user_id))
            .execute(&mut self.conn().await?)
            .await?;
        Ok(deleted == 1)
    }

    async fn game_by_id(&self, game_id: Uuid) -> StoreResult<Option<Game>> {
        let game = games::table
            .find(game_id)
            .select(Game::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(game)
    }

    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let rows = games::table
            .order(games::name.asc())
            .select(Game::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn insert_game(&self, new_game: NewGame) -> StoreResult<Game> {
        let game = diesel::insert_into(games::table)
            .values(&new_game)
            .returning(Game::as_returning())
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(game)
    }

    async fn occupied_single_slots(&self, game_id: Uuid) -> StoreResult<i64> {
        let count = users::table
            .filter(users::game_id.eq(game_id))
            .filter(users::team_id.is_null())
            .count()
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(count)
    }

    async fn occupied_team_slots(&self, game_id: Uuid) -> StoreResult<i64> {
        let count = teams::table
            .filter(teams::game_id.eq(game_id))
            .count()
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(count)
    }

    async fn single_entrants(&self, game_id: Uuid) -> StoreResult<Vec<User>> {
        let rows = users::table
            .filter(users::game_id.eq(game_id))
            .filter(users::team_id.is_null())
            .order(users::display_name.asc())
            .select(User::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn team_by_id(&self, team_id: Uuid) -> StoreResult<Option<Team>> {
        let team = teams::table
            .find(team_id)
            .select(Team::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(team)
    }

    async fn team_by_code(&self, team_code: &str) -> StoreResult<Option<Team>> {
        let team = teams::table
            .filter(teams::team_code.eq(team_code))
            .select(Team::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(team)
    }

    async fn team_by_leader(&self, leader_user_id: Uuid) -> StoreResult<Option<Team>> {
        let team = teams::table
            .filter(teams::leader_user_id.eq(leader_user_id))
            .select(Team::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(team)
    }

    async fn teams_of_game(&self, game_id: Uuid) -> StoreResult<Vec<Team>> {
        let rows = teams::table
            .filter(teams::game_id.eq(game_id))
            .order(teams::name.asc())
            .select(Team::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let rows = teams::table
            .order(teams::name.asc())
            .select(Team::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn team_code_exists(&self, team_code: &str) -> StoreResult<bool> {
        let count: i64 = teams::table
            .filter(teams::team_code.eq(team_code))
            .count()
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(count > 0)
    }

    async fn membership_count(&self, team_id: Uuid) -> StoreResult<i64> {
        let count = team_members::table
            .filter(team_members::team_id.eq(team_id))
            .count()
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(count)
    }

    async fn team_member_users(&self, team_id: Uuid) -> StoreResult<Vec<User>> {
        let rows = team_members::table
            .inner_join(users::table)
            .filter(team_members::team_id.eq(team_id))
            .order(users::display_name.asc())
            .select(User::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn assign_single(&self, user_id: Uuid, game_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let result = conn
            .build_transaction()
            .serializable()
            .run(|conn| {
                async move {
                    let game: Option<Game> = games::table
                        .find(game_id)
                        .select(Game::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(game) = game else {
                        return Err(DieselError::RollbackTransaction);
                    };
                    let occupied: i64 = users::table
                        .filter(users::game_id.eq(game_id))
                        .filter(users::team_id.is_null())
                        .count()
                        .get_result(conn)
                        .await?;
                    if occupied >= i64::from(game.slots) {
                        return Err(DieselError::RollbackTransaction);
                    }
                    let updated = diesel::update(
                        users::table
                            .find(user_id)
                            .filter(users::game_id.is_null()),
                    )
                    .set((
                        users::game_id.eq(game_id),
                        users::team_id.eq(None::<Uuid>),
                        users::updated_at.eq(chrono::Utc::now()),
                    ))
                    .execute(conn)
                    .await?;
                    if updated != 1 {
                        return Err(DieselError::RollbackTransaction);
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        rollback_as_false(result)
    }

    async fn create_team_with_leader(&self, new_team: NewTeam) -> StoreResult<Option<Team>> {
        let mut conn = self.conn().await?;
        let result = conn
            .build_transaction()
            .serializable()
            .run(|conn| {
                async move {
                    let game: Option<Game> = games::table
                        .find(new_team.game_id)
                        .select(Game::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(game) = game else {
                        return Err(DieselError::RollbackTransaction);
                    };
                    let formed: i64 = teams::table
                        .filter(teams::game_id.eq(new_team.game_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if formed >= i64::from(game.slots) {
                        return Err(DieselError::RollbackTransaction);
                    }
                    let team: Team = diesel::insert_into(teams::table)
                        .values(&new_team)
                        .returning(Team::as_returning())
                        .get_result(conn)
                        .await?;
                    let updated = diesel::update(
                        users::table
                            .find(team.leader_user_id)
                            .filter(users::game_id.is_null()),
                    )
                    .set((
                        users::game_id.eq(team.game_id),
                        users::team_id.eq(team.id),
                        users::updated_at.eq(chrono::Utc::now()),
                    ))
                    .execute(conn)
                    .await?;
                    if updated != 1 {
                        return Err(DieselError::RollbackTransaction);
                    }
                    Ok(team)
                }
                .scope_boxed()
            })
            .await;
        match result {
            Ok(team) => Ok(Some(team)),
            Err(DieselError::RollbackTransaction) => Ok(None),
            // Unique `team_code` lost the check-then-insert race; the
            // caller draws a fresh code and retries.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let result = conn
            .build_transaction()
            .serializable()
            .run(|conn| {
                async move {
                    let team: Option<Team> = teams::table
                        .find(team_id)
                        .select(Team::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(team) = team else {
                        return Err(DieselError::RollbackTransaction);
                    };
                    let game: Game = games::table
                        .find(team.game_id)
                        .select(Game::as_select())
                        .first(conn)
                        .await?;
                    if let Some(team_size) = game.team_size {
                        let members: i64 = team_members::table
                            .filter(team_members::team_id.eq(team_id))
                            .count()
                            .get_result(conn)
                            .await?;
                        // +1 for the leader, who has no membership row.
                        if members + 1 >= i64::from(team_size) {
                            return Err(DieselError::RollbackTransaction);
                        }
                    }
                    diesel::insert_into(team_members::table)
                        .values(&NewTeamMember { team_id, user_id })
                        .execute(conn)
                        .await?;
                    let updated = diesel::update(
                        users::table
                            .find(user_id)
                            .filter(users::game_id.is_null()),
                    )
                    .set((
                        users::game_id.eq(team.game_id),
                        users::team_id.eq(team.id),
                        users::updated_at.eq(chrono::Utc::now()),
                    ))
                    .execute(conn)
                    .await?;
                    if updated != 1 {
                        return Err(DieselError::RollbackTransaction);
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        rollback_as_false(result)
    }

    async fn create_team_roster(
        &self,
        new_team: NewTeam,
        member_ids: &[Uuid],
    ) -> StoreResult<Option<Team>> {
        let mut conn = self.conn().await?;
        let result = conn
            .build_transaction()
            .serializable()
            .run(|conn| {
                async move {
                    let game: Option<Game> = games::table
                        .find(new_team.game_id)
                        .select(Game::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(game) = game else {
                        return Err(DieselError::RollbackTransaction);
                    };
                    let formed: i64 = teams::table
                        .filter(teams::game_id.eq(new_team.game_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if formed >= i64::from(game.slots) {
                        return Err(DieselError::RollbackTransaction);
                    }
                    let team: Team = diesel::insert_into(teams::table)
                        .values(&new_team)
                        .returning(Team::as_returning())
                        .get_result(conn)
                        .await?;
                    let mut assignees = vec![team.leader_user_id];
                    assignees.extend_from_slice(member_ids);
                    for (idx, assignee) in assignees.iter().enumerate() {
                        if idx > 0 {
                            diesel::insert_into(team_members::table)
                                .values(&NewTeamMember {
                                    team_id: team.id,
                                    user_id: *assignee,
                                })
                                .execute(conn)
                                .await?;
                        }
                        let updated = diesel::update(
                            users::table
                                .find(*assignee)
                                .filter(users::game_id.is_null()),
                        )
                        .set((
                            users::game_id.eq(team.game_id),
                            users::team_id.eq(team.id),
                            users::updated_at.eq(chrono::Utc::now()),
                        ))
                        .execute(conn)
                        .await?;
                        if updated != 1 {
                            return Err(DieselError::RollbackTransaction);
                        }
                    }
                    Ok(team)
                }
                .scope_boxed()
            })
            .await;
        match result {
            Ok(team) => Ok(Some(team)),
            Err(DieselError::RollbackTransaction) => Ok(None),
            // Unique `team_code` lost the check-then-insert race; the
            // caller draws a fresh code and retries.
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(StoreError::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn release_user(&self, user_id: Uuid) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(team_members::table.filter(team_members::user_id.eq(user_id)))
                    .execute(conn)
                    .await?;
                diesel::update(users::table.find(user_id))
                    .set((
                        users::game_id.eq(None::<Uuid>),
                        users::team_id.eq(None::<Uuid>),
                        users::updated_at.eq(chrono::Utc::now()),
                    ))
                    .execute(conn)
                    .await?;
                Ok::<_, DieselError>(())
            }
            .scope_boxed()
        })
        .await?;
        Ok(())
    }

    async fn dissolve_team(&self, team_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let result = conn
            .transaction(|conn| {
                async move {
                    let exists: i64 = teams::table
                        .filter(teams::id.eq(team_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if exists == 0 {
                        return Err(DieselError::RollbackTransaction);
                    }
                    unassign_team_users(conn, team_id).await?;
                    diesel::delete(teams::table.find(team_id))
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        rollback_as_false(result)
    }

    async fn delete_game_cascade(&self, game_id: Uuid) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let result = conn
            .transaction(|conn| {
                async move {
                    let exists: i64 = games::table
                        .filter(games::id.eq(game_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    if exists == 0 {
                        return Err(DieselError::RollbackTransaction);
                    }
                    diesel::update(users::table.filter(users::game_id.eq(game_id)))
                        .set((
                            users::game_id.eq(None::<Uuid>),
                            users::team_id.eq(None::<Uuid>),
                            users::updated_at.eq(chrono::Utc::now()),
                        ))
                        .execute(conn)
                        .await?;
                    let game_teams = teams::table
                        .filter(teams::game_id.eq(game_id))
                        .select(teams::id);
                    diesel::delete(
                        team_members::table.filter(team_members::team_id.eq_any(game_teams)),
                    )
                    .execute(conn)
                    .await?;
                    diesel::delete(teams::table.filter(teams::game_id.eq(game_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(games::table.find(game_id))
                        .execute(conn)
                        .await?;
                    Ok(())
                }
                .scope_boxed()
            })
            .await;
        rollback_as_false(result)
    }

    async fn clear_participants(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(team_members::table).execute(conn).await?;
                diesel::delete(teams::table).execute(conn).await?;
                diesel::update(users::table)
                    .set((
                        users::game_id.eq(None::<Uuid>),
                        users::team_id.eq(None::<Uuid>),
                    ))
                    .execute(conn)
                    .await?;
                diesel::delete(
                    users::table.filter(users::role.ne(crate::db::models::UserRole::Admin)),
                )
                .execute(conn)
                .await?;
                Ok::<_, DieselError>(())
            }
            .scope_boxed()
        })
        .await?;
        Ok(())
    }

    async fn clear_event(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(team_members::table).execute(conn).await?;
                diesel::delete(teams::table).execute(conn).await?;
                diesel::update(users::table)
                    .set((
                        users::game_id.eq(None::<Uuid>),
                        users::team_id.eq(None::<Uuid>),
                    ))
                    .execute(conn)
                    .await?;
                diesel::delete(
                    users::table.filter(users::role.ne(crate::db::models::UserRole::Admin)),
                )
                .execute(conn)
                .await?;
                diesel::delete(games::table).execute(conn).await?;
                diesel::delete(whitelist_phones::table).execute(conn).await?;
                Ok::<_, DieselError>(())
            }
            .scope_boxed()
        })
        .await?;
        Ok(())
    }

    async fn whitelist_contains(&self, phone: &str) -> StoreResult<bool> {
        let count: i64 = whitelist_phones::table
            .filter(whitelist_phones::phone.eq(phone))
            .count()
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(count > 0)
    }

    async fn list_whitelist(&self) -> StoreResult<Vec<WhitelistPhone>> {
        let rows = whitelist_phones::table
            .order(whitelist_phones::added_at.asc())
            .select(WhitelistPhone::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(rows)
    }

    async fn add_whitelist_phone(&self, phone: &str) -> StoreResult<bool> {
        let inserted = diesel::insert_into(whitelist_phones::table)
            .values((
                whitelist_phones::phone.eq(phone),
                whitelist_phones::added_at.eq(chrono::Utc::now()),
            ))
            .on_conflict_do_nothing()
            .execute(&mut self.conn().await?)
            .await?;
        Ok(inserted == 1)
    }

    async fn remove_whitelist_phone(&self, phone: &str) -> StoreResult<bool> {
        let deleted = diesel::delete(
            whitelist_phones::table.filter(whitelist_phones::phone.eq(phone)),
        )
        .execute(&mut self.conn().await?)
        .await?;
        Ok(deleted == 1)
    }

    async fn certificate_settings(&self) -> StoreResult<CertificateSettings> {
        let settings = certificate_settings::table
            .select(CertificateSettings::as_select())
            .first(&mut self.conn().await?)
            .await?;
        Ok(settings)
    }

    async fn update_certificate_settings(
        &self,
        certificates_enabled: bool,
        event_name: String,
        event_date: NaiveDate,
    ) -> StoreResult<CertificateSettings> {
        let settings = diesel::update(certificate_settings::table)
            .set((
                certificate_settings::certificates_enabled.eq(certificates_enabled),
                certificate_settings::event_name.eq(event_name),
                certificate_settings::event_date.eq(event_date),
            ))
            .returning(CertificateSettings::as_returning())
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(settings)
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct ProfileChangeset {
    display_name: Option<String>,
    class_section: Option<String>,
    password_hash: Option<String>,
}

impl From<UserProfileChanges> for ProfileChangeset {
    fn from(changes: UserProfileChanges) -> Self {
        Self {
            display_name: changes.display_name,
            class_section: changes.class_section,
            password_hash: changes.password_hash,
        }
    }
}
