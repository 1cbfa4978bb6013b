//! Driving port for the advance lifecycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Advance, AdvanceId, Amount, Error, ProjectId, UserId};

/// Request to issue or request an advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdvanceRequest {
    pub requester: UserId,
    pub project_id: ProjectId,
    /// Holder of the new advance; the requester when absent.
    pub beneficiary_id: Option<UserId>,
    pub amount: Amount,
    pub description: String,
}

/// Driving port for advance transitions.
///
/// Targets the requester cannot see are reported as `not_found`; visible
/// targets the requester may not act on are `forbidden`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvanceCommand: Send + Sync {
    async fn create_advance(&self, request: CreateAdvanceRequest) -> Result<Advance, Error>;

    async fn approve_advance(
        &self,
        requester: &UserId,
        advance_id: &AdvanceId,
    ) -> Result<Advance, Error>;

    async fn reject_advance(
        &self,
        requester: &UserId,
        advance_id: &AdvanceId,
        reason: &str,
    ) -> Result<Advance, Error>;
}
