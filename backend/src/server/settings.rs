//! Server settings loaded via OrthoConfig.
//!
//! Values come from `STOREFRONT_*` environment variables, an optional
//! configuration file or the command line, in increasing precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors raised when a setting is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("admin_username and admin_password must be set together")]
    PartialAdmin,
}

/// Configuration values controlling the HTTP server and its stores.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STOREFRONT")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. Without one the in-memory store is used.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[ortho_config(default = 30)]
    pub db_connection_timeout_secs: u64,
    /// Per-request budget for store calls, in seconds.
    #[ortho_config(default = 15)]
    pub request_timeout_secs: u64,
    /// Apply embedded migrations before serving; on unless set to false.
    pub run_migrations: Option<bool>,
    /// Account granted `admin` at start-up, created when absent.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

/// Credentials of the bootstrap administrator.
pub struct AdminAccount {
    pub username: String,
    pub password: Zeroizing<String>,
}

impl ServerSettings {
    /// Parsed listen address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    pub fn db_connection_timeout(&self) -> Result<Duration, SettingsError> {
        non_zero_secs(self.db_connection_timeout_secs, "db_connection_timeout_secs")
    }

    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        non_zero_secs(self.request_timeout_secs, "request_timeout_secs")
    }

    /// Whether start-up applies pending migrations.
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Bootstrap administrator, when both halves are configured.
    pub fn admin_account(&self) -> Result<Option<AdminAccount>, SettingsError> {
        match (&self.admin_username, &self.admin_password) {
            (Some(username), Some(password)) => Ok(Some(AdminAccount {
                username: username.clone(),
                password: Zeroizing::new(password.clone()),
            })),
            (None, None) => Ok(None),
            _ => Err(SettingsError::PartialAdmin),
        }
    }
}

fn non_zero_secs(secs: u64, name: &'static str) -> Result<Duration, SettingsError> {
    if secs == 0 {
        return Err(SettingsError::Zero { name });
    }
    Ok(Duration::from_secs(secs))
}
