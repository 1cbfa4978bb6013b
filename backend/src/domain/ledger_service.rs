//! Service behind the ledger driving ports.
//!
//! Every command follows the same shape: load the requester and their
//! tenant snapshot, check visibility (`not_found`) before authority
//! (`forbidden`), run the pure engine, commit the resulting change set in
//! one unit of work, then publish its events. Publishing is best effort.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use tracing::{debug, warn};

use crate::domain::ports::{
    ChangePublisher, LedgerRepository, LedgerRepositoryError, LedgerUnitOfWork,
    LedgerUnitOfWorkError, SnapshotScope, WorkspaceQuery,
};
use crate::domain::{
    Advance, AdvanceId, Error, Expense, ExpenseId, LedgerChangeSet, LedgerPolicy, LedgerSnapshot,
    Project, ProjectId, User, UserId, VisibilityScope, VisibleLedger, has_approval_authority,
    visible_ledger,
};

pub(crate) fn map_repository_error(error: LedgerRepositoryError) -> Error {
    match error {
        LedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ledger repository unavailable: {message}"))
        }
        LedgerRepositoryError::Query { message } => {
            Error::internal(format!("ledger repository error: {message}"))
        }
    }
}

pub(crate) fn map_unit_of_work_error(error: LedgerUnitOfWorkError) -> Error {
    match error {
        LedgerUnitOfWorkError::Connection { message } => {
            Error::service_unavailable(format!("ledger store unavailable: {message}"))
        }
        LedgerUnitOfWorkError::Query { message } => {
            Error::internal(format!("ledger write failed: {message}"))
        }
        LedgerUnitOfWorkError::Conflict { message } => Error::conflict(format!(
            "the record changed while you were editing it: {message}"
        )),
    }
}

/// Ledger command and query service.
pub struct LedgerService<R, W> {
    repo: Arc<R>,
    unit_of_work: Arc<W>,
    publisher: Arc<dyn ChangePublisher>,
    clock: Arc<dyn Clock>,
    policy: LedgerPolicy,
}

impl<R, W> LedgerService<R, W> {
    /// Create a service over a read port, a unit of work and a change feed.
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use advance_ledger::domain::LedgerService;
    /// # use advance_ledger::domain::ports::{
    /// #     FixtureChangePublisher, FixtureLedgerRepository, FixtureLedgerUnitOfWork,
    /// # };
    /// # use mockable::DefaultClock;
    /// let service = LedgerService::new(
    ///     Arc::new(FixtureLedgerRepository),
    ///     Arc::new(FixtureLedgerUnitOfWork),
    ///     Arc::new(FixtureChangePublisher),
    ///     Arc::new(DefaultClock),
    ///     Default::default(),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(
        repo: Arc<R>,
        unit_of_work: Arc<W>,
        publisher: Arc<dyn ChangePublisher>,
        clock: Arc<dyn Clock>,
        policy: LedgerPolicy,
    ) -> Self {
        Self {
            repo,
            unit_of_work,
            publisher,
            clock,
            policy,
        }
    }

    pub(crate) fn repo(&self) -> &R {
        self.repo.as_ref()
    }

    pub(crate) fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }
}

/// A requester together with the slice of the ledger they work in.
pub(crate) struct Workspace {
    requester: User,
    snapshot: LedgerSnapshot,
    scope: VisibilityScope,
}

impl Workspace {
    pub(crate) fn new(requester: User, snapshot: LedgerSnapshot, scope: VisibilityScope) -> Self {
        Self {
            requester,
            snapshot,
            scope,
        }
    }

    pub(crate) fn requester(&self) -> &User {
        &self.requester
    }

    pub(crate) fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    pub(crate) fn into_scope(self) -> VisibilityScope {
        self.scope
    }

    /// Any stored user, visible or not. Used for authority checks.
    pub(crate) fn user(&self, id: UserId) -> Option<&User> {
        self.snapshot.users.iter().find(|user| user.id() == id)
    }

    pub(crate) fn visible_user(&self, id: UserId) -> Result<&User, Error> {
        self.user(id)
            .filter(|user| self.scope.can_see_user(user.id()))
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    pub(crate) fn visible_project(&self, id: ProjectId) -> Result<&Project, Error> {
        self.snapshot
            .projects
            .iter()
            .find(|project| project.id() == id && self.scope.can_see_project(id))
            .ok_or_else(|| Error::not_found(format!("project {id} not found")))
    }

    pub(crate) fn visible_advance(&self, id: AdvanceId) -> Result<&Advance, Error> {
        self.snapshot
            .advances
            .iter()
            .find(|advance| advance.id() == id && self.scope.can_see_advance(id))
            .ok_or_else(|| Error::not_found(format!("advance {id} not found")))
    }

    pub(crate) fn visible_expense(&self, id: ExpenseId) -> Result<&Expense, Error> {
        self.snapshot
            .expenses
            .iter()
            .find(|expense| expense.id() == id && self.scope.can_see_expense(id))
            .ok_or_else(|| Error::not_found(format!("expense {id} not found")))
    }

    /// The advance an expense belongs to.
    pub(crate) fn advance_of(&self, expense: &Expense) -> Result<&Advance, Error> {
        self.snapshot
            .advances
            .iter()
            .find(|advance| advance.id() == expense.advance_id())
            .ok_or_else(|| Error::internal(format!("expense {} has no advance", expense.id())))
    }

    pub(crate) fn expenses_of(&self, advance_id: AdvanceId) -> Vec<Expense> {
        self.snapshot
            .expenses
            .iter()
            .filter(|expense| expense.advance_id() == advance_id)
            .cloned()
            .collect()
    }

    /// Refuse unless the requester may approve requests owned by
    /// `owner_id`.
    pub(crate) fn require_authority_over(&self, owner_id: UserId) -> Result<(), Error> {
        if self.requester.id() == owner_id {
            return Err(Error::forbidden("you cannot review your own request"));
        }
        if has_approval_authority(&self.requester, owner_id, self.user(owner_id)) {
            Ok(())
        } else {
            Err(Error::forbidden(
                "you do not have approval authority over this user",
            ))
        }
    }
}

fn snapshot_scope(requester: &User, policy: LedgerPolicy) -> SnapshotScope {
    if requester.is_admin() && policy.visibility.admin_sees_all_projects {
        SnapshotScope::All
    } else {
        SnapshotScope::Tenant(requester.tenant_root())
    }
}

/// Load the session user and the snapshot their role works over.
///
/// A session whose user was deleted is treated as logged out.
pub(crate) async fn load_workspace<R>(
    repo: &R,
    requester: &UserId,
    policy: LedgerPolicy,
) -> Result<Workspace, Error>
where
    R: LedgerRepository + ?Sized,
{
    let requester = repo
        .find_user(requester)
        .await
        .map_err(map_repository_error)?
        .ok_or_else(|| Error::unauthorized("session user no longer exists"))?;
    let snapshot = repo
        .load_snapshot(snapshot_scope(&requester, policy))
        .await
        .map_err(map_repository_error)?;
    let scope = VisibilityScope::compute(&requester, &snapshot, policy.visibility);
    Ok(Workspace::new(requester, snapshot, scope))
}

impl<R, W> LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    pub(crate) async fn workspace(&self, requester: &UserId) -> Result<Workspace, Error> {
        load_workspace(self.repo.as_ref(), requester, self.policy).await
    }

    /// Commit `changes` and broadcast their events.
    pub(crate) async fn commit(&self, changes: LedgerChangeSet) -> Result<(), Error> {
        self.unit_of_work
            .commit(&changes)
            .await
            .map_err(map_unit_of_work_error)?;
        let events = changes.events();
        debug!(events = events.len(), "ledger change set committed");
        if let Err(err) = self.publisher.publish(&events) {
            warn!(error = %err, "failed to publish ledger changes");
        }
        Ok(())
    }
}

#[async_trait]
impl<R, W> WorkspaceQuery for LedgerService<R, W>
where
    R: LedgerRepository,
    W: LedgerUnitOfWork,
{
    async fn visible_workspace(&self, requester: &UserId) -> Result<VisibleLedger, Error> {
        let workspace = self.workspace(requester).await?;
        Ok(visible_ledger(
            workspace.requester(),
            workspace.snapshot(),
            self.policy.visibility,
        ))
    }
}

#[cfg(test)]
#[path = "ledger_service_tests.rs"]
mod tests;
