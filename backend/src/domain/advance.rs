//! Cash advances and their lifecycle.
//!
//! ```text
//! PENDING --approve--> OPEN --settle--> CLOSED
//!    \
//!     --reject--> REJECTED
//! ```
//!
//! `amount` is fixed at issue. `remaining_amount` starts equal to it and is
//! decremented by each approved expense. It may go negative; deficits are
//! reconciled at settlement.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::round_cents;
use super::{AdvanceId, Amount, ProjectId, UserId};

/// Maximum length of free-text advance fields.
pub const ADVANCE_TEXT_MAX: usize = 500;
/// Prefix of carry-forward advance descriptions.
pub const CARRY_FORWARD_PREFIX: &str = "deficit settlement: ";

/// Flat advance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvanceStatus {
    Pending,
    Open,
    Closed,
    Rejected,
}

impl AdvanceStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether the advance still blocks project archival.
    #[must_use]
    pub const fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Open)
    }
}

impl fmt::Display for AdvanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(format!("unknown advance status: {other}")),
        }
    }
}

/// Reconciliation figures recorded when an advance closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementData {
    pub total_approved_expenses: Decimal,
    pub returned_cash_amount: Amount,
    /// Positive when the holder owes money; zero or negative otherwise.
    pub deficit_amount: Decimal,
    pub notes: Option<String>,
    pub settlement_date: NaiveDate,
}

/// Status together with the data only that status carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceState {
    Pending,
    Open,
    Closed(SettlementData),
    Rejected { reason: String },
}

impl AdvanceState {
    /// Flat status of this state.
    #[must_use]
    pub const fn status(&self) -> AdvanceStatus {
        match self {
            Self::Pending => AdvanceStatus::Pending,
            Self::Open => AdvanceStatus::Open,
            Self::Closed(_) => AdvanceStatus::Closed,
            Self::Rejected { .. } => AdvanceStatus::Rejected,
        }
    }
}

/// Validation errors for [`Advance::issue`] and state reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceValidationError {
    NonPositiveAmount,
    EmptyDescription,
    DescriptionTooLong { max: usize },
    EmptyRejectionReason,
    InconsistentState,
}

impl fmt::Display for AdvanceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "advance amount must be greater than zero"),
            Self::EmptyDescription => write!(f, "advance description must not be empty"),
            Self::DescriptionTooLong { max } => {
                write!(f, "advance description must be at most {max} characters")
            }
            Self::EmptyRejectionReason => write!(f, "a rejection reason is required"),
            Self::InconsistentState => {
                write!(f, "advance status does not match its settlement or rejection data")
            }
        }
    }
}

impl std::error::Error for AdvanceValidationError {}

/// Transitions refused by the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceTransitionError {
    #[error("advance is {actual}, expected {expected}")]
    UnexpectedStatus {
        expected: AdvanceStatus,
        actual: AdvanceStatus,
    },
    #[error(transparent)]
    Invalid(#[from] AdvanceValidationError),
}

/// Input for issuing a new advance.
#[derive(Debug, Clone)]
pub struct AdvanceDraft {
    pub id: AdvanceId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub created_by: UserId,
    pub amount: Amount,
    pub description: String,
    pub date: NaiveDate,
}

/// A cash float issued to one user for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AdvanceRecord", into = "AdvanceRecord")]
pub struct Advance {
    id: AdvanceId,
    project_id: ProjectId,
    user_id: UserId,
    created_by: UserId,
    amount: Amount,
    remaining_amount: Decimal,
    state: AdvanceState,
    description: String,
    date: NaiveDate,
    origin_advance_id: Option<AdvanceId>,
}

fn validate_description(raw: &str) -> Result<String, AdvanceValidationError> {
    let description = raw.trim();
    if description.is_empty() {
        return Err(AdvanceValidationError::EmptyDescription);
    }
    if description.chars().count() > ADVANCE_TEXT_MAX {
        return Err(AdvanceValidationError::DescriptionTooLong {
            max: ADVANCE_TEXT_MAX,
        });
    }
    Ok(description.to_owned())
}

/// Trim a free-text reason and require it to be non-empty.
pub(crate) fn require_reason(reason: &str) -> Result<String, AdvanceValidationError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(AdvanceValidationError::EmptyRejectionReason);
    }
    Ok(trimmed.to_owned())
}

impl Advance {
    /// Issue a new advance in `initial` status (PENDING or OPEN).
    ///
    /// `remaining_amount` starts equal to `amount`.
    pub fn issue(
        draft: AdvanceDraft,
        initial: AdvanceStatus,
    ) -> Result<Self, AdvanceValidationError> {
        if draft.amount.is_zero() {
            return Err(AdvanceValidationError::NonPositiveAmount);
        }
        let state = match initial {
            AdvanceStatus::Pending => AdvanceState::Pending,
            AdvanceStatus::Open => AdvanceState::Open,
            AdvanceStatus::Closed | AdvanceStatus::Rejected => {
                return Err(AdvanceValidationError::InconsistentState);
            }
        };
        Ok(Self {
            id: draft.id,
            project_id: draft.project_id,
            user_id: draft.user_id,
            created_by: draft.created_by,
            amount: draft.amount,
            remaining_amount: draft.amount.value(),
            state,
            description: validate_description(&draft.description)?,
            date: draft.date,
            origin_advance_id: None,
        })
    }

    /// Build the OPEN debt advance that carries `deficit` forward from a
    /// closed advance.
    pub fn carry_forward(
        closed: &Self,
        deficit: Amount,
        date: NaiveDate,
    ) -> Result<Self, AdvanceValidationError> {
        let mut description = format!("{CARRY_FORWARD_PREFIX}{}", closed.description);
        if description.chars().count() > ADVANCE_TEXT_MAX {
            description = description.chars().take(ADVANCE_TEXT_MAX).collect();
        }
        let mut advance = Self::issue(
            AdvanceDraft {
                id: closed.id.carry_forward(),
                project_id: closed.project_id,
                user_id: closed.user_id,
                created_by: closed.created_by,
                amount: deficit,
                description,
                date,
            },
            AdvanceStatus::Open,
        )?;
        advance.origin_advance_id = Some(closed.id);
        Ok(advance)
    }

    pub fn id(&self) -> AdvanceId {
        self.id
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// The holder of the advance.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn remaining_amount(&self) -> Decimal {
        self.remaining_amount
    }

    pub fn state(&self) -> &AdvanceState {
        &self.state
    }

    pub fn status(&self) -> AdvanceStatus {
        self.state.status()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The advance whose settlement deficit this one carries, if any.
    pub fn origin_advance_id(&self) -> Option<AdvanceId> {
        self.origin_advance_id
    }

    pub fn settlement(&self) -> Option<&SettlementData> {
        match &self.state {
            AdvanceState::Closed(data) => Some(data),
            _ => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.state {
            AdvanceState::Rejected { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether approved spend exceeds the issued amount.
    pub fn is_overdrawn(&self) -> bool {
        self.remaining_amount.is_sign_negative() && !self.remaining_amount.is_zero()
    }

    fn expect_status(&self, expected: AdvanceStatus) -> Result<(), AdvanceTransitionError> {
        let actual = self.status();
        if actual == expected {
            Ok(())
        } else {
            Err(AdvanceTransitionError::UnexpectedStatus { expected, actual })
        }
    }

    /// PENDING → OPEN.
    pub fn approve(&self) -> Result<Self, AdvanceTransitionError> {
        self.expect_status(AdvanceStatus::Pending)?;
        Ok(Self {
            state: AdvanceState::Open,
            ..self.clone()
        })
    }

    /// PENDING → REJECTED with a non-empty reason.
    pub fn reject(&self, reason: &str) -> Result<Self, AdvanceTransitionError> {
        let reason = require_reason(reason)?;
        self.expect_status(AdvanceStatus::Pending)?;
        Ok(Self {
            state: AdvanceState::Rejected { reason },
            ..self.clone()
        })
    }

    /// Decrement the balance by an approved expense. Only OPEN advances
    /// accept spend; the result may be negative.
    pub fn debit(&self, expense_amount: Amount) -> Result<Self, AdvanceTransitionError> {
        self.expect_status(AdvanceStatus::Open)?;
        Ok(Self {
            remaining_amount: round_cents(self.remaining_amount - expense_amount.value()),
            ..self.clone()
        })
    }

    /// Move the balance after an approved expense was re-priced from
    /// `previous` to `revised`.
    pub fn reprice(&self, previous: Amount, revised: Amount) -> Result<Self, AdvanceTransitionError> {
        self.expect_status(AdvanceStatus::Open)?;
        Ok(Self {
            remaining_amount: round_cents(
                self.remaining_amount + previous.value() - revised.value(),
            ),
            ..self.clone()
        })
    }

    /// OPEN → CLOSED, recording the settlement.
    pub fn close(&self, settlement: SettlementData) -> Result<Self, AdvanceTransitionError> {
        self.expect_status(AdvanceStatus::Open)?;
        Ok(Self {
            state: AdvanceState::Closed(settlement),
            ..self.clone()
        })
    }
}

/// Flat wire, storage and change-feed representation of an [`Advance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRecord {
    pub id: AdvanceId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub created_by: UserId,
    pub amount: Amount,
    pub remaining_amount: Decimal,
    pub status: AdvanceStatus,
    pub description: String,
    pub date: NaiveDate,
    pub settlement_data: Option<SettlementData>,
    pub rejection_reason: Option<String>,
    pub origin_advance_id: Option<AdvanceId>,
}

impl From<Advance> for AdvanceRecord {
    fn from(value: Advance) -> Self {
        let status = value.status();
        let (settlement_data, rejection_reason) = match value.state {
            AdvanceState::Closed(data) => (Some(data), None),
            AdvanceState::Rejected { reason } => (None, Some(reason)),
            AdvanceState::Pending | AdvanceState::Open => (None, None),
        };
        Self {
            id: value.id,
            project_id: value.project_id,
            user_id: value.user_id,
            created_by: value.created_by,
            amount: value.amount,
            remaining_amount: value.remaining_amount,
            status,
            description: value.description,
            date: value.date,
            settlement_data,
            rejection_reason,
            origin_advance_id: value.origin_advance_id,
        }
    }
}

impl TryFrom<AdvanceRecord> for Advance {
    type Error = AdvanceValidationError;

    fn try_from(value: AdvanceRecord) -> Result<Self, Self::Error> {
        let state = match (value.status, value.settlement_data, value.rejection_reason) {
            (AdvanceStatus::Pending, None, None) => AdvanceState::Pending,
            (AdvanceStatus::Open, None, None) => AdvanceState::Open,
            (AdvanceStatus::Closed, Some(data), None) => AdvanceState::Closed(data),
            (AdvanceStatus::Rejected, None, Some(reason)) => AdvanceState::Rejected {
                reason: require_reason(&reason)?,
            },
            _ => return Err(AdvanceValidationError::InconsistentState),
        };
        if value.amount.is_zero() {
            return Err(AdvanceValidationError::NonPositiveAmount);
        }
        Ok(Self {
            id: value.id,
            project_id: value.project_id,
            user_id: value.user_id,
            created_by: value.created_by,
            amount: value.amount,
            remaining_amount: value.remaining_amount,
            state,
            description: validate_description(&value.description)?,
            date: value.date,
            origin_advance_id: value.origin_advance_id,
        })
    }
}
