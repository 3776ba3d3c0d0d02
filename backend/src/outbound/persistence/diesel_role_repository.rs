//! PostgreSQL-backed `RoleRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{RoleRepository, RoleRepositoryError};
use crate::domain::{RoleName, RoleSet, UserId};

use super::diesel_error_mapping::{
    TxError, is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::pool::{DbPool, PoolError};
use super::schema::{roles, user_roles, users};

/// Diesel-backed implementation of the `RoleRepository` port.
#[derive(Clone)]
pub struct DieselRoleRepository {
    pool: DbPool,
}

impl DieselRoleRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RoleRepositoryError {
    map_basic_pool_error(error, RoleRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> RoleRepositoryError {
    map_basic_diesel_error(
        error,
        RoleRepositoryError::query,
        RoleRepositoryError::connection,
    )
}

fn map_grant_error(error: diesel::result::Error, user_id: UserId) -> RoleRepositoryError {
    if is_foreign_key_violation(&error) {
        RoleRepositoryError::user_not_found(user_id.get())
    } else {
        map_diesel_error(error)
    }
}

fn require_user(found: Option<i64>, user_id: UserId) -> Result<(), RoleRepositoryError> {
    match found {
        Some(_) => Ok(()),
        None => Err(RoleRepositoryError::user_not_found(user_id.get())),
    }
}

impl DieselRoleRepository {
    async fn role_id(&self, role: &RoleName) -> Result<i32, RoleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        roles::table
            .filter(roles::name.eq(role.as_str()))
            .select(roles::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| RoleRepositoryError::role_not_found(role.as_str()))
    }
}

#[async_trait]
impl RoleRepository for DieselRoleRepository {
    async fn grant(&self, user_id: UserId, role: &RoleName) -> Result<bool, RoleRepositoryError> {
        let role_id = self.role_id(role).await?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let inserted = diesel::insert_into(user_roles::table)
            .values((
                user_roles::user_id.eq(user_id.get()),
                user_roles::role_id.eq(role_id),
            ))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| map_grant_error(err, user_id))?;

        Ok(inserted > 0)
    }

    async fn revoke(&self, user_id: UserId, role: &RoleName) -> Result<bool, RoleRepositoryError> {
        let role_id = self.role_id(role).await?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<RoleRepositoryError>, _>(|conn| {
            async move {
                let found: Option<i64> = users::table
                    .find(user_id.get())
                    .select(users::id)
                    .for_key_share()
                    .first(conn)
                    .await
                    .optional()?;
                require_user(found, user_id).map_err(TxError::Domain)?;

                let deleted = diesel::delete(
                    user_roles::table
                        .filter(user_roles::user_id.eq(user_id.get()))
                        .filter(user_roles::role_id.eq(role_id)),
                )
                .execute(conn)
                .await?;

                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| err.into_repository_error(map_diesel_error))
    }

    async fn roles_for(&self, user_id: UserId) -> Result<RoleSet, RoleRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let names: Vec<String> = user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(user_id.get()))
            .select(roles::name)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        names
            .iter()
            .map(|name| {
                RoleName::new(name)
                    .map_err(|err| RoleRepositoryError::query(format!("invalid stored role: {err}")))
            })
            .collect()
    }
}
