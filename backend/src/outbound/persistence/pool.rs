//! PostgreSQL connection pool for the storefront repositories.
//!
//! Built once in `main` and handed to every Diesel adapter. Each repository
//! call checks one connection out for its whole unit of work; the guard goes
//! back to the pool when dropped, including when a request timeout drops the
//! in-flight future. A checkout that cannot complete within the configured
//! timeout becomes [`PoolError::Checkout`], which the adapters report as a
//! `Connection` failure.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_MIN_IDLE: u32 = 2;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool construction and checkout failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became available in time.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// The pool could not be built from its configuration.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Checkout failure with the given message.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Build failure with the given message.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Sizing and timeout settings for [`DbPool`].
///
/// ```
/// use std::time::Duration;
/// use storefront::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://shop@localhost/storefront")
///     .with_max_size(1)
///     .with_connection_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_size(), 1);
/// assert_eq!(config.min_idle(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Ten connections, two kept idle, thirty-second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: Some(DEFAULT_MIN_IDLE),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
        }
    }

    /// Cap on open connections.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Connections kept open while idle; `None` lets the pool drain.
    #[must_use]
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// How long a repository call waits for a free connection.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Target database.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Cap on open connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Idle floor, never above [`Self::max_size`].
    pub fn min_idle(&self) -> Option<u32> {
        self.min_idle.map(|idle| idle.min(self.max_size))
    }

    fn validate(&self) -> Result<(), PoolError> {
        if self.max_size == 0 {
            return Err(PoolError::build("max_size must be at least 1"));
        }
        if self.connection_timeout.is_zero() {
            return Err(PoolError::build("connection_timeout must be positive"));
        }
        Ok(())
    }
}

/// Occupancy snapshot used in start-up and diagnostic logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, busy or idle.
    pub connections: u32,
    /// Open connections not checked out.
    pub idle: u32,
}

/// Shared PostgreSQL pool; clones refer to the same connections.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool, establishing the idle floor eagerly.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] for unusable settings or when the initial
    /// connections cannot be made.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url());

        let pool = Pool::builder()
            .max_size(config.max_size())
            .min_idle(config.min_idle())
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner: pool })
    }

    /// Check out one connection for a unit of work.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] when none frees up within the timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    /// Current occupancy.
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state();
        PoolStatus {
            connections: state.connections,
            idle: state.idle_connections,
        }
    }
}
