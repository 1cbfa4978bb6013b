//! Ledger events and the notifications they produce.
//!
//! Services describe what happened with a [`LedgerEvent`]; the event decides
//! who hears about it and how the message reads. The resulting
//! [`Notification`]s join the same change set as the write that caused them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{Amount, Notification, NotificationKind, UserId};

/// Something worth telling a user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A PENDING advance awaits the holder's manager.
    AdvanceRequested {
        approver: Option<UserId>,
        holder_name: String,
        amount: Amount,
    },
    /// Someone issued an OPEN advance to another user.
    AdvanceIssued {
        beneficiary: UserId,
        issuer_name: String,
        amount: Amount,
    },
    AdvanceApproved {
        holder: UserId,
        amount: Amount,
    },
    AdvanceRejected {
        holder: UserId,
        reason: String,
    },
    ExpenseSubmitted {
        approver: Option<UserId>,
        submitter_name: String,
        amount: Amount,
    },
    ExpenseApproved {
        owner: UserId,
        amount: Amount,
    },
    ExpenseRejected {
        owner: UserId,
        reason: String,
    },
    ExpenseUnlocked {
        owner: UserId,
        description: String,
    },
    AdvanceSettled {
        holder: UserId,
        deficit: Decimal,
    },
    DebtCarriedForward {
        holder: UserId,
        amount: Amount,
    },
}

impl LedgerEvent {
    fn recipient(&self) -> Option<UserId> {
        match self {
            Self::AdvanceRequested { approver, .. } | Self::ExpenseSubmitted { approver, .. } => {
                *approver
            }
            Self::AdvanceIssued { beneficiary, .. } => Some(*beneficiary),
            Self::AdvanceApproved { holder, .. }
            | Self::AdvanceRejected { holder, .. }
            | Self::AdvanceSettled { holder, .. }
            | Self::DebtCarriedForward { holder, .. } => Some(*holder),
            Self::ExpenseApproved { owner, .. }
            | Self::ExpenseRejected { owner, .. }
            | Self::ExpenseUnlocked { owner, .. } => Some(*owner),
        }
    }

    fn kind(&self) -> NotificationKind {
        match self {
            Self::AdvanceRequested { .. }
            | Self::ExpenseSubmitted { .. }
            | Self::ExpenseUnlocked { .. } => NotificationKind::Info,
            Self::AdvanceIssued { .. }
            | Self::AdvanceApproved { .. }
            | Self::ExpenseApproved { .. } => NotificationKind::Success,
            Self::AdvanceRejected { .. } | Self::ExpenseRejected { .. } => NotificationKind::Error,
            Self::AdvanceSettled { deficit, .. } if *deficit > Decimal::ZERO => {
                NotificationKind::Warning
            }
            Self::AdvanceSettled { .. } => NotificationKind::Success,
            Self::DebtCarriedForward { .. } => NotificationKind::Warning,
        }
    }

    /// Human-readable message text.
    pub fn message(&self) -> String {
        match self {
            Self::AdvanceRequested {
                holder_name,
                amount,
                ..
            } => format!("{holder_name} requested an advance of {amount}"),
            Self::AdvanceIssued {
                issuer_name,
                amount,
                ..
            } => format!("{issuer_name} issued you an advance of {amount}"),
            Self::AdvanceApproved { amount, .. } => {
                format!("Your advance of {amount} was approved")
            }
            Self::AdvanceRejected { reason, .. } => {
                format!("Your advance request was rejected: {reason}")
            }
            Self::ExpenseSubmitted {
                submitter_name,
                amount,
                ..
            } => format!("{submitter_name} submitted an expense of {amount}"),
            Self::ExpenseApproved { amount, .. } => {
                format!("Your expense of {amount} was approved")
            }
            Self::ExpenseRejected { reason, .. } => {
                format!("Your expense was rejected: {reason}")
            }
            Self::ExpenseUnlocked { description, .. } => {
                format!("Your expense \"{description}\" was unlocked for editing")
            }
            Self::AdvanceSettled { deficit, .. } if *deficit > Decimal::ZERO => {
                format!("Your advance was settled with a deficit of {deficit}")
            }
            Self::AdvanceSettled { .. } => "Your advance was settled".to_owned(),
            Self::DebtCarriedForward { amount, .. } => {
                format!("A deficit of {amount} was carried into a new advance")
            }
        }
    }

    /// The notification for this event, if anyone should receive one.
    pub fn notification(&self, at: DateTime<Utc>) -> Option<Notification> {
        self.recipient()
            .map(|recipient| Notification::new(recipient, self.kind(), self.message(), at))
    }
}

/// Notifications for every event that has a recipient.
pub fn notifications_for(
    events: impl IntoIterator<Item = LedgerEvent>,
    at: DateTime<Utc>,
) -> Vec<Notification> {
    events
        .into_iter()
        .filter_map(|event| event.notification(at))
        .collect()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for notification routing.
    use super::*;
    use crate::domain::test_fixtures::amount;
    use rstest::rstest;

    #[rstest]
    fn request_without_approver_notifies_nobody() {
        let event = LedgerEvent::AdvanceRequested {
            approver: None,
            holder_name: "Ali".to_owned(),
            amount: amount(100),
        };
        assert!(event.notification(Utc::now()).is_none());
    }

    #[rstest]
    fn rejection_is_an_error_addressed_to_the_owner() {
        let owner = UserId::random();
        let note = LedgerEvent::ExpenseRejected {
            owner,
            reason: "no receipt".to_owned(),
        }
        .notification(Utc::now())
        .expect("notification");
        assert_eq!(note.user_id(), owner);
        assert_eq!(note.kind(), NotificationKind::Error);
        assert_eq!(note.message(), "Your expense was rejected: no receipt");
        assert!(!note.is_read());
    }

    #[rstest]
    #[case(Decimal::from(250), NotificationKind::Warning)]
    #[case(Decimal::ZERO, NotificationKind::Success)]
    #[case(Decimal::from(-40), NotificationKind::Success)]
    fn settlement_severity_follows_deficit(
        #[case] deficit: Decimal,
        #[case] expected: NotificationKind,
    ) {
        let event = LedgerEvent::AdvanceSettled {
            holder: UserId::random(),
            deficit,
        };
        assert_eq!(event.kind(), expected);
    }

    #[rstest]
    fn batch_skips_events_without_recipient() {
        let holder = UserId::random();
        let notes = notifications_for(
            [
                LedgerEvent::ExpenseSubmitted {
                    approver: None,
                    submitter_name: "Ali".to_owned(),
                    amount: amount(5),
                },
                LedgerEvent::AdvanceApproved {
                    holder,
                    amount: amount(5),
                },
            ],
            Utc::now(),
        );
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message(), "Your advance of 5.00 was approved");
    }
}
