//! Strongly typed entity identifiers.
//!
//! Every aggregate is keyed by a UUID. Distinct newtypes stop an advance id
//! from being passed where an expense id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdValidationError {
    kind: &'static str,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from its textual UUID form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdValidationError> {
                Uuid::parse_str(raw.as_ref().trim())
                    .map(Self)
                    .map_err(|_| IdValidationError { kind: $label })
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Borrow the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Identifier of a [`crate::domain::User`].
    UserId,
    "user id"
);
define_id!(
    /// Identifier of a [`crate::domain::Project`].
    ProjectId,
    "project id"
);
define_id!(
    /// Identifier of an [`crate::domain::Advance`].
    AdvanceId,
    "advance id"
);
define_id!(
    /// Identifier of an [`crate::domain::Expense`].
    ExpenseId,
    "expense id"
);
define_id!(
    /// Identifier of a [`crate::domain::Notification`].
    NotificationId,
    "notification id"
);

/// Namespace for ids derived from a settled advance.
const CARRY_FORWARD_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2d8e_3b4a_4c5d_9e0f_a1b2_c3d4_e5f6);

impl AdvanceId {
    /// Deterministic id of the carry-forward advance spawned when this
    /// advance settles with a deficit.
    ///
    /// Retrying a settlement therefore targets the same record.
    #[must_use]
    pub fn carry_forward(&self) -> Self {
        Self(Uuid::new_v5(&CARRY_FORWARD_NAMESPACE, self.0.as_bytes()))
    }
}
