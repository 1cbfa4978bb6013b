//! Settlement preview and closing.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::advance_service::map_advance_transition;
use crate::domain::ledger_service::{LedgerService, Workspace};
use crate::domain::ports::{
    LedgerRepository, LedgerUnitOfWork, SettleAdvanceRequest, SettleAdvanceResponse,
    SettlementCommand,
};
use crate::domain::{
    Advance, AdvanceId, AdvanceStatus, Amount, Error, LedgerChangeSet, LedgerEvent,
    SettlementError, SettlementPreview, UserId, notifications_for, settle,
};

fn map_settlement_error(error: SettlementError) -> Error {
    match error {
        SettlementError::Transition(err) => map_advance_transition(err),
        SettlementError::NotesTooLong { .. } => Error::invalid_request(error.to_string()),
        SettlementError::Deficit(_) | SettlementError::CarryForward(_) => {
            Error::internal(error.to_string())
        }
    }
}

/// The OPEN advance `requester` is allowed to settle.
///
/// Settling is reserved for admins and covers every advance they can see,
/// their own included.
fn settleable(workspace: &Workspace, advance_id: AdvanceId) -> Result<&Advance, Error> {
    if !workspace.requester().is_admin() {
        return Err(Error::forbidden("only admins can settle advances"));
    }
    let advance = workspace.visible_advance(advance_id)?;
    if advance.status() != AdvanceStatus::Open {
        return Err(Error::conflict(format!(
            "only OPEN advances can be settled; advance {} is {}",
            advance.id(),
            advance.status()
        )));
    }
    Ok(advance)
}

#[async_trait]
impl<R, W> SettlementCommand for LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    async fn preview_settlement(
        &self,
        requester: &UserId,
        advance_id: &AdvanceId,
        returned_cash: Amount,
    ) -> Result<SettlementPreview, Error> {
        let workspace = self.workspace(requester).await?;
        let advance = settleable(&workspace, *advance_id)?;
        Ok(SettlementPreview::compute(
            advance,
            &workspace.expenses_of(advance.id()),
            returned_cash,
        ))
    }

    async fn settle_advance(
        &self,
        request: SettleAdvanceRequest,
    ) -> Result<SettleAdvanceResponse, Error> {
        let workspace = self.workspace(&request.requester).await?;
        let advance = settleable(&workspace, request.advance_id)?;
        let outcome = settle(
            advance,
            &workspace.expenses_of(advance.id()),
            request.returned_cash_amount,
            request.notes,
            self.today(),
        )
        .map_err(map_settlement_error)?;

        let deficit = outcome.preview.deficit;
        if deficit < Decimal::ZERO {
            info!(
                advance_id = %advance.id(),
                surplus = %deficit.abs(),
                "advance settled with more cash returned than owed"
            );
        }

        let mut events = vec![LedgerEvent::AdvanceSettled {
            holder: advance.user_id(),
            deficit,
        }];
        let mut changes = LedgerChangeSet::new().update_advance(advance, outcome.closed.clone());
        if let Some(carry) = &outcome.carry_forward {
            events.push(LedgerEvent::DebtCarriedForward {
                holder: carry.user_id(),
                amount: carry.amount(),
            });
            changes = changes.insert_advance_if_absent(carry.clone());
        }

        info!(
            advance_id = %advance.id(),
            deficit = %deficit,
            carried = outcome.carry_forward.is_some(),
            "advance settled"
        );
        self.commit(changes.notify_all(notifications_for(events, self.now())))
            .await?;
        Ok(SettleAdvanceResponse {
            advance: outcome.closed,
            carry_forward: outcome.carry_forward,
            preview: outcome.preview,
        })
    }
}

#[cfg(test)]
#[path = "settlement_service_tests.rs"]
mod tests;
