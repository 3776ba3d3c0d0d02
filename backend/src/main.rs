//! Storefront entry-point: loads configuration, prepares the stores and
//! serves the REST API.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig as _;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, ServerSettings, bootstrap_admin, build_http_state, create_server};
use storefront::inbound::http::health::HealthState;
use storefront::inbound::http::session_config::fingerprint::key_fingerprint;
use storefront::inbound::http::session_config::{BuildMode, session_settings_from_env};
use storefront::outbound::persistence::{DbPool, PoolConfig, run_migrations};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load()?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        ttl_hours = session.ttl_hours,
        "session key loaded"
    );

    let mut config = ServerConfig::new(session, settings.bind_addr()?)
        .with_request_timeout(settings.request_timeout()?);
    if let Some(database_url) = settings.database_url.as_deref() {
        if settings.run_migrations() {
            let applied = run_migrations(database_url).await?;
            info!(applied, "database schema is current");
        }
        let pool = DbPool::new(
            PoolConfig::new(database_url)
                .with_max_size(settings.db_max_connections)
                .with_connection_timeout(settings.db_connection_timeout()?),
        )
        .await?;
        let status = pool.status();
        info!(
            connections = status.connections,
            idle = status.idle,
            "database pool ready"
        );
        config = config.with_db_pool(pool);
    }
    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(server::storefront_metrics());
    }

    let http_state = build_http_state(&config);
    if let Some(admin) = settings.admin_account()? {
        bootstrap_admin(&http_state, &admin).await?;
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, config)?;
    info!("storefront listening");
    server.await?;
    health_state.mark_unhealthy();
    Ok(())
}
