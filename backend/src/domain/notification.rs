//! User-facing notifications produced by ledger events.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NotificationId, UserId};

/// Severity used by clients to style a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INFO" => Ok(Self::Info),
            "SUCCESS" => Ok(Self::Success),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: NotificationId,
    user_id: UserId,
    message: String,
    #[serde(rename = "type")]
    kind: NotificationKind,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::random(),
            user_id,
            message: message.into(),
            kind,
            is_read: false,
            created_at,
        }
    }

    /// Rebuild a stored notification.
    pub fn restore(
        id: NotificationId,
        user_id: UserId,
        kind: NotificationKind,
        message: String,
        is_read: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            message,
            kind,
            is_read,
            created_at,
        }
    }

    #[must_use]
    pub fn mark_read(&self) -> Self {
        Self {
            is_read: true,
            ..self.clone()
        }
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Recipient.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
