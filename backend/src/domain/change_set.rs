//! Atomic groups of ledger writes.
//!
//! Every use case that touches more than one record (approving an expense
//! debits its advance, settling closes one advance and may open another)
//! collects its writes into a [`LedgerChangeSet`] that a unit-of-work adapter
//! commits all-or-nothing. Updates carry a guard describing the row they
//! were computed from; a guard that no longer matches aborts the commit.

use rust_decimal::Decimal;

use super::{
    Advance, AdvanceStatus, ChangeEvent, Expense, ExpenseStatus, Notification, Project,
    ProjectStatus, User, UserId,
};

/// The stored state an advance update was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceGuard {
    pub status: AdvanceStatus,
    pub remaining_amount: Decimal,
}

impl AdvanceGuard {
    pub fn of(advance: &Advance) -> Self {
        Self {
            status: advance.status(),
            remaining_amount: advance.remaining_amount(),
        }
    }

    /// Whether `stored` still matches this guard.
    pub fn matches(&self, stored: &Advance) -> bool {
        *self == Self::of(stored)
    }
}

/// The stored state an expense update was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseGuard {
    pub status: ExpenseStatus,
    pub is_editable: bool,
}

impl ExpenseGuard {
    pub fn of(expense: &Expense) -> Self {
        Self {
            status: expense.status(),
            is_editable: expense.is_editable(),
        }
    }

    pub fn matches(&self, stored: &Expense) -> bool {
        *self == Self::of(stored)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserWrite {
    Insert(User),
    Delete(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectWrite {
    Insert(Project),
    Update {
        project: Project,
        expected: ProjectStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceWrite {
    Insert(Advance),
    /// Insert unless a row with the same id already exists.
    InsertIfAbsent(Advance),
    Update {
        advance: Advance,
        expected: AdvanceGuard,
    },
}

impl AdvanceWrite {
    pub fn advance(&self) -> &Advance {
        match self {
            Self::Insert(advance)
            | Self::InsertIfAbsent(advance)
            | Self::Update { advance, .. } => advance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseWrite {
    Insert(Expense),
    Update {
        expense: Expense,
        expected: ExpenseGuard,
    },
}

impl ExpenseWrite {
    pub fn expense(&self) -> &Expense {
        match self {
            Self::Insert(expense) | Self::Update { expense, .. } => expense,
        }
    }
}

/// Writes committed together.
///
/// Adapters apply users, projects, advances, expenses and notifications in
/// that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerChangeSet {
    users: Vec<UserWrite>,
    projects: Vec<ProjectWrite>,
    advances: Vec<AdvanceWrite>,
    expenses: Vec<ExpenseWrite>,
    notifications: Vec<Notification>,
}

impl LedgerChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(mut self, user: User) -> Self {
        self.users.push(UserWrite::Insert(user));
        self
    }

    pub fn delete_user(mut self, id: UserId) -> Self {
        self.users.push(UserWrite::Delete(id));
        self
    }

    pub fn insert_project(mut self, project: Project) -> Self {
        self.projects.push(ProjectWrite::Insert(project));
        self
    }

    pub fn update_project(mut self, before: &Project, after: Project) -> Self {
        self.projects.push(ProjectWrite::Update {
            project: after,
            expected: before.status(),
        });
        self
    }

    pub fn insert_advance(mut self, advance: Advance) -> Self {
        self.advances.push(AdvanceWrite::Insert(advance));
        self
    }

    pub fn insert_advance_if_absent(mut self, advance: Advance) -> Self {
        self.advances.push(AdvanceWrite::InsertIfAbsent(advance));
        self
    }

    pub fn update_advance(mut self, before: &Advance, after: Advance) -> Self {
        self.advances.push(AdvanceWrite::Update {
            advance: after,
            expected: AdvanceGuard::of(before),
        });
        self
    }

    pub fn insert_expense(mut self, expense: Expense) -> Self {
        self.expenses.push(ExpenseWrite::Insert(expense));
        self
    }

    pub fn update_expense(mut self, before: &Expense, after: Expense) -> Self {
        self.expenses.push(ExpenseWrite::Update {
            expense: after,
            expected: ExpenseGuard::of(before),
        });
        self
    }

    pub fn notify(mut self, notification: Notification) -> Self {
        self.notifications.push(notification);
        self
    }

    /// Append every notification in `notifications`.
    pub fn notify_all(mut self, notifications: impl IntoIterator<Item = Notification>) -> Self {
        self.notifications.extend(notifications);
        self
    }

    pub fn users(&self) -> &[UserWrite] {
        &self.users
    }

    pub fn projects(&self) -> &[ProjectWrite] {
        &self.projects
    }

    pub fn advances(&self) -> &[AdvanceWrite] {
        &self.advances
    }

    pub fn expenses(&self) -> &[ExpenseWrite] {
        &self.expenses
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.projects.is_empty()
            && self.advances.is_empty()
            && self.expenses.is_empty()
            && self.notifications.is_empty()
    }

    /// Change-feed events describing this change set once committed.
    pub fn events(&self) -> Vec<ChangeEvent> {
        let users = self.users.iter().map(|write| match write {
            UserWrite::Insert(user) => ChangeEvent::user_inserted(user),
            UserWrite::Delete(id) => ChangeEvent::user_deleted(*id),
        });
        let projects = self.projects.iter().map(|write| match write {
            ProjectWrite::Insert(project) => ChangeEvent::project_inserted(project),
            ProjectWrite::Update { project, .. } => ChangeEvent::project_updated(project),
        });
        let advances = self.advances.iter().map(|write| match write {
            AdvanceWrite::Insert(advance) | AdvanceWrite::InsertIfAbsent(advance) => {
                ChangeEvent::advance_inserted(advance)
            }
            AdvanceWrite::Update { advance, .. } => ChangeEvent::advance_updated(advance),
        });
        let expenses = self.expenses.iter().map(|write| match write {
            ExpenseWrite::Insert(expense) => ChangeEvent::expense_inserted(expense),
            ExpenseWrite::Update { expense, .. } => ChangeEvent::expense_updated(expense),
        });
        let notifications = self
            .notifications
            .iter()
            .map(ChangeEvent::notification_inserted);
        users
            .chain(projects)
            .chain(advances)
            .chain(expenses)
            .chain(notifications)
            .collect()
    }
}
