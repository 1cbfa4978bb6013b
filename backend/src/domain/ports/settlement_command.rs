//! Driving port for advance settlement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Advance, AdvanceId, Amount, Error, SettlementPreview, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleAdvanceRequest {
    pub requester: UserId,
    pub advance_id: AdvanceId,
    pub returned_cash_amount: Amount,
    pub notes: Option<String>,
}

/// The closed advance and the debt advance spawned by a positive deficit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleAdvanceResponse {
    pub advance: Advance,
    pub carry_forward: Option<Advance>,
    pub preview: SettlementPreview,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementCommand: Send + Sync {
    /// Compute settlement figures without writing anything.
    async fn preview_settlement(
        &self,
        requester: &UserId,
        advance_id: &AdvanceId,
        returned_cash: Amount,
    ) -> Result<SettlementPreview, Error>;

    async fn settle_advance(
        &self,
        request: SettleAdvanceRequest,
    ) -> Result<SettleAdvanceResponse, Error>;
}
