//! Runtime configuration loaded via OrthoConfig.
//!
//! Two layers are read at startup: [`ServerSettings`] (prefix
//! `ADVANCE_LEDGER`, also accepts CLI flags) for process wiring, and
//! [`LedgerSettings`] (prefix `LEDGER`) for business rule switches.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::SameSite;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    FundingPolicy, LedgerPolicy, RoleProfile, User, UserDraft, UserId, UserValidationError,
    VisibilityPolicy,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_RECEIPT_DIR: &str = "receipts";
const DEFAULT_RECEIPT_BASE_URL: &str = "/receipts";
const DEFAULT_WS_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Invalid values found while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid same-site policy {0}; expected lax, strict or none")]
    SameSite(String),
}

/// Process-level server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ADVANCE_LEDGER")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_max_connections: Option<u32>,
    /// File holding the session signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Allow a throwaway session key when the key file is unreadable.
    pub session_allow_ephemeral: Option<bool>,
    /// Mark the session cookie `Secure`. On unless set to false.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for the session cookie.
    pub cookie_same_site: Option<String>,
    /// Comma-separated origins allowed to open the change-feed socket.
    pub ws_allowed_origins: Option<String>,
}

impl ServerSettings {
    pub fn session_allow_ephemeral(&self) -> bool {
        self.session_allow_ephemeral.unwrap_or(false)
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn ws_allowed_origins(&self) -> &str {
        self.ws_allowed_origins
            .as_deref()
            .unwrap_or(DEFAULT_WS_ALLOWED_ORIGINS)
    }

    pub fn same_site(&self) -> Result<SameSite, SettingsError> {
        match self.cookie_same_site.as_deref().map(str::to_ascii_lowercase) {
            None => Ok(SameSite::Lax),
            Some(value) => match value.as_str() {
                "lax" => Ok(SameSite::Lax),
                "strict" => Ok(SameSite::Strict),
                "none" => Ok(SameSite::None),
                _ => Err(SettingsError::SameSite(value)),
            },
        }
    }
}

/// Business rule switches and receipt storage location.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LEDGER")]
pub struct LedgerSettings {
    /// Open advances an engineer issues to their own technicians at once.
    /// On unless set to false.
    pub engineer_direct_funding: Option<bool>,
    /// Refuse expense approvals that would overdraw the advance.
    pub reject_overdraft: Option<bool>,
    /// Show every project to admins, not only those they own.
    pub admin_sees_all_projects: Option<bool>,
    /// Directory receipts are written to.
    pub receipt_dir: Option<PathBuf>,
    /// Public URL prefix receipts are served under.
    pub receipt_base_url: Option<String>,
    /// Shared password accepted by the development login adapter.
    pub dev_login_password: Option<String>,
    /// Email of the tenant root created on first start, if any.
    pub admin_email: Option<String>,
    /// Display name for that admin.
    pub admin_name: Option<String>,
}

impl LedgerSettings {
    /// Rule switches with unset values taken from [`LedgerPolicy::default`].
    pub fn policy(&self) -> LedgerPolicy {
        let defaults = LedgerPolicy::default();
        LedgerPolicy {
            funding: FundingPolicy {
                engineer_direct_funding: self
                    .engineer_direct_funding
                    .unwrap_or(defaults.funding.engineer_direct_funding),
            },
            visibility: VisibilityPolicy {
                admin_sees_all_projects: self
                    .admin_sees_all_projects
                    .unwrap_or(defaults.visibility.admin_sees_all_projects),
            },
            reject_overdraft: self.reject_overdraft.unwrap_or(defaults.reject_overdraft),
        }
    }

    pub fn receipt_dir(&self) -> PathBuf {
        self.receipt_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RECEIPT_DIR))
    }

    /// The first-start admin described by `admin_email` and `admin_name`.
    ///
    /// # Errors
    /// Returns the validation failure when the email is malformed.
    pub fn bootstrap_admin(&self) -> Result<Option<User>, UserValidationError> {
        let Some(email) = self.admin_email.as_deref() else {
            return Ok(None);
        };
        User::new(UserDraft {
            id: UserId::random(),
            name: self
                .admin_name
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_owned()),
            email: email.to_owned(),
            profile: RoleProfile::Admin,
            job_title: None,
            phone: None,
            avatar_url: None,
        })
        .map(Some)
    }

    pub fn receipt_base_url(&self) -> &str {
        self.receipt_base_url
            .as_deref()
            .unwrap_or(DEFAULT_RECEIPT_BASE_URL)
            .trim_end_matches('/')
    }
}
