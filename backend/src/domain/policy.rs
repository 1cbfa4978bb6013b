//! Tunable ledger rules shared by the services.

use super::{FundingPolicy, VisibilityPolicy};

/// Rule switches resolved from configuration at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerPolicy {
    pub funding: FundingPolicy,
    pub visibility: VisibilityPolicy,
    /// Refuse expense approvals that would overdraw the advance.
    pub reject_overdraft: bool,
}
