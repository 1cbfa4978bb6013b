//! Advance creation, approval and rejection.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ledger_service::LedgerService;
use crate::domain::ports::{
    AdvanceCommand, CreateAdvanceRequest, LedgerRepository, LedgerUnitOfWork,
};
use crate::domain::{
    Advance, AdvanceDraft, AdvanceId, AdvanceStatus, AdvanceTransitionError, Error,
    LedgerChangeSet, LedgerEvent, UserId, can_fund, initial_advance_status, notifications_for,
};

pub(crate) fn map_advance_transition(error: AdvanceTransitionError) -> Error {
    match error {
        AdvanceTransitionError::UnexpectedStatus { .. } => Error::conflict(error.to_string()),
        AdvanceTransitionError::Invalid(err) => Error::invalid_request(err.to_string()),
    }
}

#[async_trait]
impl<R, W> AdvanceCommand for LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    async fn create_advance(&self, request: CreateAdvanceRequest) -> Result<Advance, Error> {
        let workspace = self.workspace(&request.requester).await?;
        let requester = workspace.requester();
        let project = workspace.visible_project(request.project_id)?;
        if !project.is_active() {
            return Err(Error::conflict("advances cannot be issued on an archived project"));
        }

        let beneficiary = match request.beneficiary_id {
            Some(id) if id != requester.id() => {
                let beneficiary = workspace.visible_user(id)?;
                if !can_fund(requester, beneficiary) {
                    return Err(Error::forbidden("you cannot issue advances to this user"));
                }
                beneficiary
            }
            _ => requester,
        };

        let status = initial_advance_status(requester, beneficiary, self.policy().funding);
        let advance = Advance::issue(
            AdvanceDraft {
                id: AdvanceId::random(),
                project_id: project.id(),
                user_id: beneficiary.id(),
                created_by: requester.id(),
                amount: request.amount,
                description: request.description,
                date: self.today(),
            },
            status,
        )
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        let event = match status {
            AdvanceStatus::Pending => Some(LedgerEvent::AdvanceRequested {
                approver: beneficiary.manager_id(),
                holder_name: beneficiary.name().to_owned(),
                amount: advance.amount(),
            }),
            _ if beneficiary.id() != requester.id() => Some(LedgerEvent::AdvanceIssued {
                beneficiary: beneficiary.id(),
                issuer_name: requester.name().to_owned(),
                amount: advance.amount(),
            }),
            _ => None,
        };

        info!(
            advance_id = %advance.id(),
            holder = %advance.user_id(),
            status = %advance.status(),
            "advance created"
        );
        self.commit(
            LedgerChangeSet::new()
                .insert_advance(advance.clone())
                .notify_all(notifications_for(event, self.now())),
        )
        .await?;
        Ok(advance)
    }

    async fn approve_advance(
        &self,
        requester: &UserId,
        advance_id: &AdvanceId,
    ) -> Result<Advance, Error> {
        let workspace = self.workspace(requester).await?;
        let advance = workspace.visible_advance(*advance_id)?;
        workspace.require_authority_over(advance.user_id())?;
        let approved = advance.approve().map_err(map_advance_transition)?;

        info!(advance_id = %approved.id(), approver = %requester, "advance approved");
        let event = LedgerEvent::AdvanceApproved {
            holder: approved.user_id(),
            amount: approved.amount(),
        };
        self.commit(
            LedgerChangeSet::new()
                .update_advance(advance, approved.clone())
                .notify_all(notifications_for([event], self.now())),
        )
        .await?;
        Ok(approved)
    }

    async fn reject_advance(
        &self,
        requester: &UserId,
        advance_id: &AdvanceId,
        reason: &str,
    ) -> Result<Advance, Error> {
        let workspace = self.workspace(requester).await?;
        let advance = workspace.visible_advance(*advance_id)?;
        workspace.require_authority_over(advance.user_id())?;
        let rejected = advance.reject(reason).map_err(map_advance_transition)?;

        info!(advance_id = %rejected.id(), approver = %requester, "advance rejected");
        let event = LedgerEvent::AdvanceRejected {
            holder: rejected.user_id(),
            reason: rejected.rejection_reason().unwrap_or_default().to_owned(),
        };
        self.commit(
            LedgerChangeSet::new()
                .update_advance(advance, rejected.clone())
                .notify_all(notifications_for([event], self.now())),
        )
        .await?;
        Ok(rejected)
    }
}

#[cfg(test)]
#[path = "advance_service_tests.rs"]
mod tests;
