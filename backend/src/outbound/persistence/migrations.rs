//! Embedded schema migrations.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::pool::PoolError;

/// Migrations compiled in from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply pending migrations on a dedicated synchronous connection.
///
/// Runs on the blocking pool because the migration harness is synchronous.
pub async fn run_migrations(database_url: &str) -> Result<usize, PoolError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&url).map_err(|err| PoolError::build(err.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| PoolError::build(format!("migration failed: {err}")))?;
        for version in &applied {
            info!(%version, "applied migration");
        }
        Ok(applied.len())
    })
    .await
    .map_err(|err| PoolError::build(err.to_string()))?
}
