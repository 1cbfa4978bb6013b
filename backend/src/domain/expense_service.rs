//! Expense submission, editing and review.
//!
//! Approval debits the advance and re-pricing an approved expense moves the
//! balance by the difference. Both writes join the expense update in one
//! change set, so `remaining_amount` always matches approved spend.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::advance_service::map_advance_transition;
use crate::domain::ledger_service::LedgerService;
use crate::domain::ports::{
    EditExpenseRequest, ExpenseCommand, LedgerRepository, LedgerUnitOfWork, SubmitExpenseRequest,
};
use crate::domain::{
    Advance, AdvanceStatus, Error, Expense, ExpenseDraft, ExpenseId, ExpenseStatus,
    ExpenseTransitionError, LedgerChangeSet, LedgerEvent, UserId, notifications_for,
};

fn map_expense_transition(error: ExpenseTransitionError) -> Error {
    match error {
        ExpenseTransitionError::UnexpectedStatus { .. } | ExpenseTransitionError::Locked => {
            Error::conflict(error.to_string())
        }
        ExpenseTransitionError::Invalid(err) => Error::invalid_request(err.to_string()),
    }
}

fn require_open(advance: &Advance) -> Result<(), Error> {
    if advance.status() == AdvanceStatus::Open {
        Ok(())
    } else {
        Err(Error::conflict(format!(
            "advance {} is {}, expected OPEN",
            advance.id(),
            advance.status()
        )))
    }
}

impl<R, W> LedgerService<R, W> {
    /// Flag or refuse a balance that went below zero.
    fn check_overdraft(&self, advance: &Advance) -> Result<(), Error> {
        if !advance.is_overdrawn() {
            return Ok(());
        }
        if self.policy().reject_overdraft {
            return Err(Error::conflict(format!(
                "approving this expense would overdraw advance {}",
                advance.id()
            )));
        }
        warn!(
            advance_id = %advance.id(),
            remaining = %advance.remaining_amount(),
            "advance overdrawn"
        );
        Ok(())
    }
}

#[async_trait]
impl<R, W> ExpenseCommand for LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    async fn submit_expense(&self, request: SubmitExpenseRequest) -> Result<Expense, Error> {
        let workspace = self.workspace(&request.requester).await?;
        let requester = workspace.requester();
        let advance = workspace.visible_advance(request.advance_id)?;
        if advance.user_id() != requester.id() {
            return Err(Error::forbidden(
                "only the advance holder can submit expenses against it",
            ));
        }
        require_open(advance)?;

        let expense = Expense::submit(ExpenseDraft {
            id: ExpenseId::random(),
            advance_id: advance.id(),
            user_id: requester.id(),
            date: self.today(),
            content: request.expense.into(),
        })
        .map_err(|err| Error::invalid_request(err.to_string()))?;

        info!(expense_id = %expense.id(), advance_id = %advance.id(), "expense submitted");
        let event = LedgerEvent::ExpenseSubmitted {
            approver: requester.manager_id(),
            submitter_name: requester.name().to_owned(),
            amount: expense.amount(),
        };
        self.commit(
            LedgerChangeSet::new()
                .insert_expense(expense.clone())
                .notify_all(notifications_for([event], self.now())),
        )
        .await?;
        Ok(expense)
    }

    async fn edit_expense(&self, request: EditExpenseRequest) -> Result<Expense, Error> {
        let workspace = self.workspace(&request.requester).await?;
        let expense = workspace.visible_expense(request.expense_id)?;
        if expense.user_id() != request.requester {
            return Err(Error::forbidden("only the owner can edit an expense"));
        }
        let revised = expense
            .revise(request.expense.into())
            .map_err(map_expense_transition)?;

        let mut changes = LedgerChangeSet::new();
        if expense.status() == ExpenseStatus::Approved && expense.amount() != revised.amount() {
            let advance = workspace.advance_of(expense)?;
            require_open(advance)?;
            let repriced = advance
                .reprice(expense.amount(), revised.amount())
                .map_err(map_advance_transition)?;
            self.check_overdraft(&repriced)?;
            changes = changes.update_advance(advance, repriced);
        }

        info!(expense_id = %revised.id(), amount = %revised.amount(), "expense edited");
        self.commit(changes.update_expense(expense, revised.clone()))
            .await?;
        Ok(revised)
    }

    async fn approve_expense(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
    ) -> Result<Expense, Error> {
        let workspace = self.workspace(requester).await?;
        let expense = workspace.visible_expense(*expense_id)?;
        workspace.require_authority_over(expense.user_id())?;
        let approved = expense.approve().map_err(map_expense_transition)?;
        let advance = workspace.advance_of(expense)?;
        let debited = advance
            .debit(approved.amount())
            .map_err(map_advance_transition)?;
        self.check_overdraft(&debited)?;

        info!(
            expense_id = %approved.id(),
            advance_id = %debited.id(),
            remaining = %debited.remaining_amount(),
            "expense approved"
        );
        let event = LedgerEvent::ExpenseApproved {
            owner: approved.user_id(),
            amount: approved.amount(),
        };
        self.commit(
            LedgerChangeSet::new()
                .update_advance(advance, debited)
                .update_expense(expense, approved.clone())
                .notify_all(notifications_for([event], self.now())),
        )
        .await?;
        Ok(approved)
    }

    async fn reject_expense(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
        reason: &str,
    ) -> Result<Expense, Error> {
        let workspace = self.workspace(requester).await?;
        let expense = workspace.visible_expense(*expense_id)?;
        workspace.require_authority_over(expense.user_id())?;
        let rejected = expense.reject(reason).map_err(map_expense_transition)?;

        info!(expense_id = %rejected.id(), "expense rejected");
        let event = LedgerEvent::ExpenseRejected {
            owner: rejected.user_id(),
            reason: rejected.rejection_reason().unwrap_or_default().to_owned(),
        };
        self.commit(
            LedgerChangeSet::new()
                .update_expense(expense, rejected.clone())
                .notify_all(notifications_for([event], self.now())),
        )
        .await?;
        Ok(rejected)
    }

    async fn toggle_editability(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
    ) -> Result<Expense, Error> {
        let workspace = self.workspace(requester).await?;
        let expense = workspace.visible_expense(*expense_id)?;
        workspace.require_authority_over(expense.user_id())?;
        let toggled = expense.toggle_editable().map_err(map_expense_transition)?;

        let unlocked = toggled.status() == ExpenseStatus::Approved && toggled.is_editable();
        let event = unlocked.then(|| LedgerEvent::ExpenseUnlocked {
            owner: toggled.user_id(),
            description: toggled.description().to_owned(),
        });
        info!(
            expense_id = %toggled.id(),
            editable = toggled.is_editable(),
            "expense editability toggled"
        );
        self.commit(
            LedgerChangeSet::new()
                .update_expense(expense, toggled.clone())
                .notify_all(notifications_for(event, self.now())),
        )
        .await?;
        Ok(toggled)
    }
}

#[cfg(test)]
#[path = "expense_service_tests.rs"]
mod tests;
