//! Session cookie settings resolved from [`ServerSettings`].
//!
//! Release builds are strict: the key file must exist and hold at least
//! [`SESSION_KEY_MIN_LEN`] bytes, ephemeral keys are refused, and
//! `SameSite=None` requires a `Secure` cookie. Debug builds fall back to a
//! generated key with a warning.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

use advance_ledger::settings::{ServerSettings, SettingsError};

pub(crate) const SESSION_KEY_MIN_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;

/// Build mode for session validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    pub(crate) fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Resolved cookie session configuration.
pub(crate) struct SessionSettings {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum SessionConfigError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SameSite=None requires a secure session cookie")]
    InsecureSameSiteNone,
    #[error("ephemeral session keys are not allowed in release builds")]
    EphemeralNotAllowed,
}

pub(crate) fn session_settings(
    settings: &ServerSettings,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    if mode == BuildMode::Release && settings.session_allow_ephemeral() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let cookie_secure = settings.cookie_secure();
    let same_site = settings.same_site()?;
    if same_site == SameSite::None && !cookie_secure {
        if mode == BuildMode::Release {
            return Err(SessionConfigError::InsecureSameSiteNone);
        }
        warn!("SameSite=None without a secure cookie; browsers may reject it");
    }
    let key = load_key(
        settings.session_key_file(),
        mode,
        settings.session_allow_ephemeral(),
    )?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn load_key(path: PathBuf, mode: BuildMode, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %source,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

/// First eight bytes of the SHA-256 of the signing key, hex encoded.
///
/// Logged at startup so operators can tell which key is live.
pub(crate) fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
