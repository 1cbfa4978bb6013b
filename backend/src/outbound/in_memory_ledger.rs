//! Process-local ledger store.
//!
//! Backs the ledger ports when no database is configured, and the
//! behaviour tests. All tables live behind one lock; a commit is applied to
//! a scratch copy and swapped in only when every write succeeded, so a
//! failed change set leaves nothing behind.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{
    LedgerRepository, LedgerRepositoryError, LedgerUnitOfWork, LedgerUnitOfWorkError,
    NotificationRepository, NotificationRepositoryError, SnapshotScope,
};
use crate::domain::{
    Advance, AdvanceWrite, Expense, ExpenseWrite, LedgerChangeSet, LedgerSnapshot, Notification,
    NotificationId, Project, ProjectWrite, User, UserId, UserWrite,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    advances: Vec<Advance>,
    expenses: Vec<Expense>,
    notifications: Vec<Notification>,
}

fn conflict(what: &str, id: impl Display, detail: &str) -> LedgerUnitOfWorkError {
    LedgerUnitOfWorkError::conflict(format!("{what} {id} {detail}"))
}

fn stale(what: &str, id: impl Display) -> LedgerUnitOfWorkError {
    conflict(what, id, "changed since it was read")
}

impl Tables {
    fn snapshot(&self, scope: SnapshotScope) -> LedgerSnapshot {
        let SnapshotScope::Tenant(root) = scope else {
            return LedgerSnapshot {
                users: self.users.clone(),
                projects: self.projects.clone(),
                advances: self.advances.clone(),
                expenses: self.expenses.clone(),
            };
        };
        let users: Vec<User> = self
            .users
            .iter()
            .filter(|user| user.id() == root || user.root_admin_id() == Some(root))
            .cloned()
            .collect();
        let projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|project| project.manager_id() == root)
            .cloned()
            .collect();
        let advances: Vec<Advance> = self
            .advances
            .iter()
            .filter(|advance| projects.iter().any(|p| p.id() == advance.project_id()))
            .cloned()
            .collect();
        let expenses = self
            .expenses
            .iter()
            .filter(|expense| advances.iter().any(|a| a.id() == expense.advance_id()))
            .cloned()
            .collect();
        LedgerSnapshot {
            users,
            projects,
            advances,
            expenses,
        }
    }

    fn apply(&mut self, changes: &LedgerChangeSet) -> Result<(), LedgerUnitOfWorkError> {
        for write in changes.users() {
            self.apply_user(write)?;
        }
        for write in changes.projects() {
            self.apply_project(write)?;
        }
        for write in changes.advances() {
            self.apply_advance(write)?;
        }
        for write in changes.expenses() {
            self.apply_expense(write)?;
        }
        self.notifications
            .extend(changes.notifications().iter().cloned());
        Ok(())
    }

    fn apply_user(&mut self, write: &UserWrite) -> Result<(), LedgerUnitOfWorkError> {
        match write {
            UserWrite::Insert(user) => {
                let taken = self
                    .users
                    .iter()
                    .any(|stored| stored.id() == user.id() || stored.email() == user.email());
                if taken {
                    return Err(conflict("user", user.id(), "already exists"));
                }
                self.users.push(user.clone());
            }
            UserWrite::Delete(id) => {
                let before = self.users.len();
                self.users.retain(|user| user.id() != *id);
                if self.users.len() == before {
                    return Err(stale("user", id));
                }
                self.notifications
                    .retain(|notification| notification.user_id() != *id);
            }
        }
        Ok(())
    }

    fn apply_project(&mut self, write: &ProjectWrite) -> Result<(), LedgerUnitOfWorkError> {
        match write {
            ProjectWrite::Insert(project) => {
                if self.projects.iter().any(|stored| stored.id() == project.id()) {
                    return Err(conflict("project", project.id(), "already exists"));
                }
                self.projects.push(project.clone());
            }
            ProjectWrite::Update { project, expected } => {
                let slot = self
                    .projects
                    .iter_mut()
                    .find(|stored| stored.id() == project.id() && stored.status() == *expected)
                    .ok_or_else(|| stale("project", project.id()))?;
                *slot = project.clone();
            }
        }
        Ok(())
    }

    fn apply_advance(&mut self, write: &AdvanceWrite) -> Result<(), LedgerUnitOfWorkError> {
        let advance = write.advance();
        let exists = self.advances.iter().any(|stored| stored.id() == advance.id());
        match write {
            AdvanceWrite::Insert(_) if exists => {
                Err(conflict("advance", advance.id(), "already exists"))
            }
            AdvanceWrite::InsertIfAbsent(_) if exists => Ok(()),
            AdvanceWrite::Insert(_) | AdvanceWrite::InsertIfAbsent(_) => {
                self.advances.push(advance.clone());
                Ok(())
            }
            AdvanceWrite::Update { expected, .. } => {
                let slot = self
                    .advances
                    .iter_mut()
                    .find(|stored| stored.id() == advance.id() && expected.matches(stored))
                    .ok_or_else(|| stale("advance", advance.id()))?;
                *slot = advance.clone();
                Ok(())
            }
        }
    }

    fn apply_expense(&mut self, write: &ExpenseWrite) -> Result<(), LedgerUnitOfWorkError> {
        match write {
            ExpenseWrite::Insert(expense) => {
                if self.expenses.iter().any(|stored| stored.id() == expense.id()) {
                    return Err(conflict("expense", expense.id(), "already exists"));
                }
                if !self.advances.iter().any(|a| a.id() == expense.advance_id()) {
                    return Err(conflict(
                        "expense",
                        expense.id(),
                        "references a missing advance",
                    ));
                }
                self.expenses.push(expense.clone());
            }
            ExpenseWrite::Update { expense, expected } => {
                let slot = self
                    .expenses
                    .iter_mut()
                    .find(|stored| stored.id() == expense.id() && expected.matches(stored))
                    .ok_or_else(|| stale("expense", expense.id()))?;
                *slot = expense.clone();
            }
        }
        Ok(())
    }
}

/// Ledger, unit-of-work and inbox ports over shared in-process tables.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of records, e.g. demo data.
    pub fn seeded(snapshot: LedgerSnapshot) -> Self {
        let tables = Tables {
            users: snapshot.users,
            projects: snapshot.projects,
            advances: snapshot.advances,
            expenses: snapshot.expenses,
            notifications: Vec::new(),
        };
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, LedgerRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.id() == *id).cloned())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, LedgerRepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.email() == email).cloned())
    }

    async fn load_snapshot(
        &self,
        scope: SnapshotScope,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError> {
        Ok(self.tables.read().await.snapshot(scope))
    }
}

#[async_trait]
impl LedgerUnitOfWork for InMemoryLedgerStore {
    async fn commit(&self, changes: &LedgerChangeSet) -> Result<(), LedgerUnitOfWorkError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write().await;
        let mut scratch = tables.clone();
        scratch.apply(changes)?;
        *tables = scratch;
        debug!("in-memory ledger change set committed");
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryLedgerStore {
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let tables = self.tables.read().await;
        let mut inbox: Vec<Notification> = tables
            .notifications
            .iter()
            .rev()
            .filter(|notification| notification.user_id() == *user_id)
            .cloned()
            .collect();
        inbox.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(inbox)
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(slot) = tables
            .notifications
            .iter_mut()
            .find(|notification| notification.id() == *id && notification.user_id() == *user_id)
        else {
            return Ok(None);
        };
        *slot = slot.mark_read();
        Ok(Some(slot.clone()))
    }

    async fn mark_all_read(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut tables = self.tables.write().await;
        let mut changed = Vec::new();
        for slot in tables
            .notifications
            .iter_mut()
            .filter(|notification| notification.user_id() == *user_id && !notification.is_read())
        {
            *slot = slot.mark_read();
            changed.push(slot.clone());
        }
        Ok(changed)
    }
}
