//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Deleting a user relies on `ON DELETE CASCADE` for grants, cart lines and
//! purchases; reserved stock stays consumed.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NewUser, StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{LeaderboardEntry, Money, PasswordHash, User, UserId, Username};

use super::diesel_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error, map_row_error,
};
use super::models::{LeaderboardRow, NewUserRow, RowError, UserRow, money};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error, username: &Username) -> UserRepositoryError {
    if is_unique_violation(&error) {
        UserRepositoryError::username_taken(username.as_str())
    } else {
        map_diesel_error(error)
    }
}

fn map_invalid_row(error: RowError) -> UserRepositoryError {
    map_row_error(error, UserRepositoryError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .find_credentials(username)
            .await?
            .map(|stored| stored.user))
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = users::table
            .filter(users::username.eq(username.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| {
            Ok(StoredCredentials {
                user: row.to_user().map_err(map_invalid_row)?,
                password_hash: PasswordHash::new(row.password_hash),
            })
        })
        .transpose()
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::insert_into(users::table)
            .values(&NewUserRow {
                username: user.username.as_str(),
                email: &user.email,
                password_hash: user.password_hash.as_str(),
            })
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_insert_error(err, &user.username))?;

        row.to_user().map_err(map_invalid_row)
    }

    async fn update_email(&self, id: UserId, email: &str) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(users::table.find(id.get()))
            .set(users::email.eq(email))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(users::table.find(id.get()))
            .set(users::password_hash.eq(password_hash.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn top_by_balance(
        &self,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<LeaderboardRow> = users::table
            .order((users::balance_cents.desc(), users::username.asc()))
            .limit(i64::from(limit))
            .select(LeaderboardRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| LeaderboardEntry::try_from(row).map_err(map_invalid_row))
            .collect()
    }

    async fn credit_balance(
        &self,
        id: UserId,
        amount: Money,
    ) -> Result<Option<Money>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let balance: Option<i64> = diesel::update(users::table.find(id.get()))
            .set(users::balance_cents.eq(users::balance_cents + amount.cents()))
            .returning(users::balance_cents)
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        balance
            .map(|cents| money("balance_cents", cents).map_err(map_invalid_row))
            .transpose()
    }
}
