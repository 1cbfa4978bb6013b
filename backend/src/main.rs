#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Backend entry-point: loads settings, prepares storage and runs the
//! REST, WebSocket and health endpoints.

mod server;

use std::ffi::OsString;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use advance_ledger::domain::{User, ensure_admin};
use advance_ledger::inbound::http::health::HealthState;
use advance_ledger::inbound::ws::state::OriginPolicy;
use advance_ledger::outbound::persistence::{
    DbPool, DieselLedgerRepository, DieselLedgerUnitOfWork, PoolConfig, run_pending_migrations,
};
use advance_ledger::settings::{LedgerSettings, ServerSettings};

use server::session_key::{BuildMode, key_fingerprint, session_settings};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("invalid server settings: {err}"))?;
    let ledger = LedgerSettings::load_from_iter([OsString::from("advance-ledger")])
        .map_err(|err| eyre!("invalid ledger settings: {err}"))?;

    let session = session_settings(&settings, BuildMode::from_debug_assertions())
        .wrap_err("session configuration rejected")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session signing key loaded"
    );

    let admin = ledger
        .bootstrap_admin()
        .map_err(|err| eyre!("invalid bootstrap admin: {err}"))?;

    let origins = OriginPolicy::from_list(settings.ws_allowed_origins())
        .wrap_err("invalid websocket origin allow-list")?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        settings.bind_addr()?,
        ledger,
    )
    .with_origins(origins);

    match settings.database_url.clone() {
        Some(url) => {
            let pool = connect_database(url, &settings).await?;
            if let Some(admin) = admin.clone() {
                bootstrap_database_admin(&pool, admin).await?;
            }
            config = config.with_db_pool(pool);
        }
        None => warn!("no database configured; ledger data lives in memory only"),
    }
    let config = config.with_bootstrap_admin(admin);

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(
        PrometheusMetricsBuilder::new("advance_ledger")
            .endpoint("/metrics")
            .build()
            .map_err(|err| eyre!("configure Prometheus metrics: {err}"))?,
    ));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).wrap_err("failed to start server")?;
    server.await.wrap_err("server terminated abnormally")
}

async fn connect_database(url: String, settings: &ServerSettings) -> Result<DbPool> {
    let migration_url = url.clone();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .wrap_err("migration task panicked")?
        .wrap_err("database migrations failed")?;
    info!(applied, "database schema is current");

    let mut pool_config = PoolConfig::new(url);
    if let Some(max) = settings.db_max_connections {
        pool_config = pool_config.with_max_size(max);
    }
    DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")
}

async fn bootstrap_database_admin(pool: &DbPool, admin: User) -> Result<()> {
    let repo = DieselLedgerRepository::new(pool.clone());
    let unit_of_work = DieselLedgerUnitOfWork::new(pool.clone());
    let admin = ensure_admin(&repo, &unit_of_work, admin)
        .await
        .map_err(|err| eyre!("bootstrap admin rejected: {err}"))?;
    info!(admin_id = %admin.id(), "bootstrap admin ready");
    Ok(())
}
