//! Change-feed events and the per-client reaction to them.
//!
//! Committed change sets publish one [`ChangeEvent`] per written record. A
//! connected client does not receive every event: [`react`] drops records
//! outside the client's visibility scope and turns the rest into a refetch
//! hint, plus an alert for notifications addressed to that client.

use serde::Serialize;
use serde_json::{Value, json};

use super::{
    Advance, AdvanceId, AdvanceRecord, Expense, ExpenseId, ExpenseRecord, Notification,
    NotificationKind, Project, ProjectId, User, UserId, UserRecord, VisibilityScope,
};

/// Collections a change can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTable {
    Users,
    Projects,
    Advances,
    Expenses,
    Notifications,
}

/// Kind of write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A user-facing alert raised by a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

/// The record a change refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSubject {
    User(UserId),
    Project(ProjectId),
    Advance(AdvanceId),
    Expense(ExpenseId),
    Notification { recipient: UserId, alert: Alert },
}

impl ChangeSubject {
    fn table(&self) -> LedgerTable {
        match self {
            Self::User(_) => LedgerTable::Users,
            Self::Project(_) => LedgerTable::Projects,
            Self::Advance(_) => LedgerTable::Advances,
            Self::Expense(_) => LedgerTable::Expenses,
            Self::Notification { .. } => LedgerTable::Notifications,
        }
    }
}

/// One committed write, shaped as `{table, eventType, newRecord}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    table: LedgerTable,
    event_type: ChangeKind,
    new_record: Value,
    #[serde(skip)]
    subject: ChangeSubject,
}

fn to_record<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl ChangeEvent {
    fn new(subject: ChangeSubject, event_type: ChangeKind, new_record: Value) -> Self {
        Self {
            table: subject.table(),
            event_type,
            new_record,
            subject,
        }
    }

    pub fn user_inserted(user: &User) -> Self {
        Self::new(
            ChangeSubject::User(user.id()),
            ChangeKind::Insert,
            to_record(UserRecord::from(user.clone())),
        )
    }

    pub fn user_deleted(id: UserId) -> Self {
        Self::new(ChangeSubject::User(id), ChangeKind::Delete, json!({ "id": id }))
    }

    pub fn project_inserted(project: &Project) -> Self {
        Self::new(
            ChangeSubject::Project(project.id()),
            ChangeKind::Insert,
            to_record(project),
        )
    }

    pub fn project_updated(project: &Project) -> Self {
        Self::new(
            ChangeSubject::Project(project.id()),
            ChangeKind::Update,
            to_record(project),
        )
    }

    pub fn advance_inserted(advance: &Advance) -> Self {
        Self::new(
            ChangeSubject::Advance(advance.id()),
            ChangeKind::Insert,
            to_record(AdvanceRecord::from(advance.clone())),
        )
    }

    pub fn advance_updated(advance: &Advance) -> Self {
        Self::new(
            ChangeSubject::Advance(advance.id()),
            ChangeKind::Update,
            to_record(AdvanceRecord::from(advance.clone())),
        )
    }

    pub fn expense_inserted(expense: &Expense) -> Self {
        Self::new(
            ChangeSubject::Expense(expense.id()),
            ChangeKind::Insert,
            to_record(ExpenseRecord::from(expense.clone())),
        )
    }

    pub fn expense_updated(expense: &Expense) -> Self {
        Self::new(
            ChangeSubject::Expense(expense.id()),
            ChangeKind::Update,
            to_record(ExpenseRecord::from(expense.clone())),
        )
    }

    pub fn notification_inserted(notification: &Notification) -> Self {
        Self::new(
            ChangeSubject::Notification {
                recipient: notification.user_id(),
                alert: Alert {
                    message: notification.message().to_owned(),
                    kind: notification.kind(),
                },
            },
            ChangeKind::Insert,
            to_record(notification),
        )
    }

    /// A notification changed in place, e.g. it was marked read.
    pub fn notification_updated(notification: &Notification) -> Self {
        Self::new(
            ChangeSubject::Notification {
                recipient: notification.user_id(),
                alert: Alert {
                    message: notification.message().to_owned(),
                    kind: notification.kind(),
                },
            },
            ChangeKind::Update,
            to_record(notification),
        )
    }

    pub fn table(&self) -> LedgerTable {
        self.table
    }

    pub fn event_type(&self) -> ChangeKind {
        self.event_type
    }

    pub fn new_record(&self) -> &Value {
        &self.new_record
    }

    pub fn subject(&self) -> &ChangeSubject {
        &self.subject
    }
}

/// What a client should do about one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientReaction {
    /// Collection to refetch.
    pub refetch: LedgerTable,
    pub event_type: ChangeKind,
    pub record: Value,
    pub alert: Option<Alert>,
}

fn covers(scope: &VisibilityScope, subject: &ChangeSubject) -> bool {
    match subject {
        ChangeSubject::User(id) => scope.can_see_user(*id),
        ChangeSubject::Project(id) => scope.can_see_project(*id),
        ChangeSubject::Advance(id) => scope.can_see_advance(*id),
        ChangeSubject::Expense(id) => scope.can_see_expense(*id),
        ChangeSubject::Notification { .. } => false,
    }
}

/// Decide how the client of `viewer` reacts to `event`.
///
/// `before` and `after` are the viewer's scopes around the change, so a
/// record that just left the scope (a deleted user) or just entered it (a
/// new advance) is still delivered. Returns `None` when the viewer cannot
/// see the record on either side.
pub fn react(
    event: &ChangeEvent,
    viewer: UserId,
    before: &VisibilityScope,
    after: &VisibilityScope,
) -> Option<ClientReaction> {
    let (visible, alert) = match &event.subject {
        ChangeSubject::Notification { recipient, alert } => {
            let own = *recipient == viewer;
            let alert = (own && event.event_type == ChangeKind::Insert).then(|| alert.clone());
            (own, alert)
        }
        subject => (covers(before, subject) || covers(after, subject), None),
    };
    visible.then(|| ClientReaction {
        refetch: event.table,
        event_type: event.event_type,
        record: event.new_record.clone(),
        alert,
    })
}
