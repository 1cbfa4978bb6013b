//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use advance_ledger::domain::User;
use advance_ledger::inbound::ws::state::OriginPolicy;
use advance_ledger::outbound::persistence::DbPool;
use advance_ledger::settings::LedgerSettings;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) origins: OriginPolicy,
    pub(crate) ledger: LedgerSettings,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) bootstrap_admin: Option<User>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        ledger: LedgerSettings,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            origins: OriginPolicy::default(),
            ledger,
            db_pool: None,
            bootstrap_admin: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Back the ledger with PostgreSQL instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Admin seeded into the in-memory store. PostgreSQL deployments run
    /// `ensure_admin` before the server starts instead.
    #[must_use]
    pub fn with_bootstrap_admin(mut self, admin: Option<User>) -> Self {
        self.bootstrap_admin = admin;
        self
    }

    /// Origins allowed to open the change-feed socket.
    #[must_use]
    pub fn with_origins(mut self, origins: OriginPolicy) -> Self {
        self.origins = origins;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
