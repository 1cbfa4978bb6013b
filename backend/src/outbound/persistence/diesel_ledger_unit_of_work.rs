//! PostgreSQL-backed `LedgerUnitOfWork`.
//!
//! A change set is encoded into rows up front and then applied inside one
//! transaction. Guarded updates carry the expected prior state in their
//! `WHERE` clause; an update that touches no row aborts the transaction
//! with a conflict.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{LedgerUnitOfWork, LedgerUnitOfWorkError};
use crate::domain::{AdvanceWrite, ExpenseWrite, LedgerChangeSet, ProjectWrite, UserWrite};

use super::diesel_error_mapping::{is_constraint_race, map_diesel_error, map_pool_error};
use super::models::{
    AdvanceRow, AdvanceUpdate, ExpenseRow, ExpenseUpdate, NotificationRow, ProjectRow, UserRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{advances, expenses, notifications, projects, users};

/// Diesel implementation of the ledger write port.
#[derive(Clone)]
pub struct DieselLedgerUnitOfWork {
    pool: DbPool,
}

impl DieselLedgerUnitOfWork {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug)]
enum CommitError {
    Diesel(diesel::result::Error),
    Conflict(String),
}

impl From<diesel::result::Error> for CommitError {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

fn pool_error(error: PoolError) -> LedgerUnitOfWorkError {
    map_pool_error(error, |message| LedgerUnitOfWorkError::connection(message))
}

fn commit_error(error: CommitError) -> LedgerUnitOfWorkError {
    match error {
        CommitError::Conflict(message) => {
            debug!(%message, "guarded ledger write lost a race");
            LedgerUnitOfWorkError::conflict(message)
        }
        CommitError::Diesel(err) if is_constraint_race(&err) => {
            debug!(error = %err, "ledger write hit a constraint");
            LedgerUnitOfWorkError::conflict("a concurrent write claimed the same record")
        }
        CommitError::Diesel(err) => map_diesel_error(
            err,
            LedgerUnitOfWorkError::query,
            LedgerUnitOfWorkError::connection,
        ),
    }
}

fn ensure_touched(rows: usize, what: &str, id: Uuid) -> Result<(), CommitError> {
    if rows == 0 {
        return Err(CommitError::Conflict(format!(
            "{what} {id} changed since it was read"
        )));
    }
    Ok(())
}

enum UserRowWrite {
    Insert(UserRow),
    Delete(Uuid),
}

enum ProjectRowWrite {
    Insert(ProjectRow),
    Update {
        id: Uuid,
        status: String,
        expected_status: String,
    },
}

enum AdvanceRowWrite {
    Insert(AdvanceRow),
    InsertIfAbsent(AdvanceRow),
    Update {
        id: Uuid,
        changes: AdvanceUpdate,
        expected_status: String,
        expected_remaining: Decimal,
    },
}

enum ExpenseRowWrite {
    Insert(ExpenseRow),
    Update {
        id: Uuid,
        changes: ExpenseUpdate,
        expected_status: String,
        expected_editable: bool,
    },
}

/// A change set lowered to rows, ready to run without touching domain types.
struct RowWrites {
    users: Vec<UserRowWrite>,
    projects: Vec<ProjectRowWrite>,
    advances: Vec<AdvanceRowWrite>,
    expenses: Vec<ExpenseRowWrite>,
    notifications: Vec<NotificationRow>,
}

impl RowWrites {
    fn encode(changes: &LedgerChangeSet) -> Result<Self, serde_json::Error> {
        let users = changes
            .users()
            .iter()
            .map(|write| match write {
                UserWrite::Insert(user) => UserRowWrite::Insert(UserRow::from(user)),
                UserWrite::Delete(id) => UserRowWrite::Delete(*id.as_uuid()),
            })
            .collect();
        let projects = changes
            .projects()
            .iter()
            .map(|write| match write {
                ProjectWrite::Insert(project) => ProjectRowWrite::Insert(ProjectRow::from(project)),
                ProjectWrite::Update { project, expected } => ProjectRowWrite::Update {
                    id: *project.id().as_uuid(),
                    status: project.status().as_str().to_owned(),
                    expected_status: expected.as_str().to_owned(),
                },
            })
            .collect();
        let advances = changes
            .advances()
            .iter()
            .map(|write| {
                let row = AdvanceRow::try_from(write.advance())?;
                Ok(match write {
                    AdvanceWrite::Insert(_) => AdvanceRowWrite::Insert(row),
                    AdvanceWrite::InsertIfAbsent(_) => AdvanceRowWrite::InsertIfAbsent(row),
                    AdvanceWrite::Update { expected, .. } => AdvanceRowWrite::Update {
                        id: row.id,
                        expected_status: expected.status.as_str().to_owned(),
                        expected_remaining: expected.remaining_amount,
                        changes: AdvanceUpdate::from(row),
                    },
                })
            })
            .collect::<Result<_, serde_json::Error>>()?;
        let expenses = changes
            .expenses()
            .iter()
            .map(|write| {
                let row = ExpenseRow::try_from(write.expense())?;
                Ok(match write {
                    ExpenseWrite::Insert(_) => ExpenseRowWrite::Insert(row),
                    ExpenseWrite::Update { expected, .. } => ExpenseRowWrite::Update {
                        id: row.id,
                        expected_status: expected.status.as_str().to_owned(),
                        expected_editable: expected.is_editable,
                        changes: ExpenseUpdate::from(row),
                    },
                })
            })
            .collect::<Result<_, serde_json::Error>>()?;
        let notifications = changes
            .notifications()
            .iter()
            .map(NotificationRow::from)
            .collect();
        Ok(Self {
            users,
            projects,
            advances,
            expenses,
            notifications,
        })
    }

    fn len(&self) -> usize {
        self.users.len()
            + self.projects.len()
            + self.advances.len()
            + self.expenses.len()
            + self.notifications.len()
    }
}

async fn apply_users(
    conn: &mut AsyncPgConnection,
    writes: Vec<UserRowWrite>,
) -> Result<(), CommitError> {
    for write in writes {
        match write {
            UserRowWrite::Insert(row) => {
                diesel::insert_into(users::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
            }
            UserRowWrite::Delete(id) => {
                let deleted = diesel::delete(users::table.find(id)).execute(conn).await?;
                ensure_touched(deleted, "user", id)?;
            }
        }
    }
    Ok(())
}

async fn apply_projects(
    conn: &mut AsyncPgConnection,
    writes: Vec<ProjectRowWrite>,
) -> Result<(), CommitError> {
    for write in writes {
        match write {
            ProjectRowWrite::Insert(row) => {
                diesel::insert_into(projects::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
            }
            ProjectRowWrite::Update {
                id,
                status,
                expected_status,
            } => {
                let updated = diesel::update(
                    projects::table
                        .find(id)
                        .filter(projects::status.eq(expected_status)),
                )
                .set(projects::status.eq(status))
                .execute(conn)
                .await?;
                ensure_touched(updated, "project", id)?;
            }
        }
    }
    Ok(())
}

async fn apply_advances(
    conn: &mut AsyncPgConnection,
    writes: Vec<AdvanceRowWrite>,
) -> Result<(), CommitError> {
    for write in writes {
        match write {
            AdvanceRowWrite::Insert(row) => {
                diesel::insert_into(advances::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
            }
            AdvanceRowWrite::InsertIfAbsent(row) => {
                let inserted = diesel::insert_into(advances::table)
                    .values(&row)
                    .on_conflict(advances::id)
                    .do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    debug!(advance = %row.id, "advance already present; insert skipped");
                }
            }
            AdvanceRowWrite::Update {
                id,
                changes,
                expected_status,
                expected_remaining,
            } => {
                let updated = diesel::update(
                    advances::table
                        .find(id)
                        .filter(advances::status.eq(expected_status))
                        .filter(advances::remaining_amount.eq(expected_remaining)),
                )
                .set(&changes)
                .execute(conn)
                .await?;
                ensure_touched(updated, "advance", id)?;
            }
        }
    }
    Ok(())
}

async fn apply_expenses(
    conn: &mut AsyncPgConnection,
    writes: Vec<ExpenseRowWrite>,
) -> Result<(), CommitError> {
    for write in writes {
        match write {
            ExpenseRowWrite::Insert(row) => {
                diesel::insert_into(expenses::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
            }
            ExpenseRowWrite::Update {
                id,
                changes,
                expected_status,
                expected_editable,
            } => {
                let updated = diesel::update(
                    expenses::table
                        .find(id)
                        .filter(expenses::status.eq(expected_status))
                        .filter(expenses::is_editable.eq(expected_editable)),
                )
                .set(&changes)
                .execute(conn)
                .await?;
                ensure_touched(updated, "expense", id)?;
            }
        }
    }
    Ok(())
}

async fn apply(conn: &mut AsyncPgConnection, writes: RowWrites) -> Result<(), CommitError> {
    let RowWrites {
        users,
        projects,
        advances,
        expenses,
        notifications,
    } = writes;
    apply_users(conn, users).await?;
    apply_projects(conn, projects).await?;
    apply_advances(conn, advances).await?;
    apply_expenses(conn, expenses).await?;
    if !notifications.is_empty() {
        diesel::insert_into(notifications::table)
            .values(&notifications)
            .execute(conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl LedgerUnitOfWork for DieselLedgerUnitOfWork {
    async fn commit(&self, changes: &LedgerChangeSet) -> Result<(), LedgerUnitOfWorkError> {
        if changes.is_empty() {
            return Ok(());
        }
        let writes = RowWrites::encode(changes)
            .map_err(|err| LedgerUnitOfWorkError::query(format!("encode change set: {err}")))?;
        let count = writes.len();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction(|conn| async move { apply(conn, writes).await }.scope_boxed())
            .await
            .map_err(commit_error)?;
        debug!(writes = count, "ledger change set committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_fixtures::{admin, advance, amount, expense, project};
    use crate::domain::{AdvanceStatus, ProjectStatus};
    use rstest::rstest;

    #[rstest]
    fn approval_lowers_to_guarded_rows() {
        let owner = admin("Noura");
        let site = project(&owner, ProjectStatus::Active);
        let open = advance(&site, &owner, 1_000, AdvanceStatus::Open);
        let pending = expense(&open, 400);
        let approved = pending.approve().expect("approve");
        let debited = open.debit(amount(400)).expect("debit");
        let changes = LedgerChangeSet::new()
            .update_advance(&open, debited)
            .update_expense(&pending, approved);

        let writes = RowWrites::encode(&changes).expect("encodes");

        assert_eq!(writes.len(), 2);
        match writes.advances.as_slice() {
            [AdvanceRowWrite::Update {
                changes,
                expected_status,
                expected_remaining,
                ..
            }] => {
                assert_eq!(expected_status, "OPEN");
                assert_eq!(*expected_remaining, Decimal::from(1_000));
                assert_eq!(changes.remaining_amount, Decimal::from(600));
            }
            _ => panic!("expected a guarded advance update"),
        }
        match writes.expenses.as_slice() {
            [ExpenseRowWrite::Update {
                changes,
                expected_status,
                expected_editable,
                ..
            }] => {
                assert_eq!(expected_status, "PENDING");
                assert!(*expected_editable);
                assert_eq!(changes.status, "APPROVED");
            }
            _ => panic!("expected a guarded expense update"),
        }
    }

    #[rstest]
    fn archival_guards_on_the_previous_status() {
        let owner = admin("Noura");
        let site = project(&owner, ProjectStatus::Active);
        let archived = site.archive(0).expect("archive");
        let changes = LedgerChangeSet::new().update_project(&site, archived);

        let writes = RowWrites::encode(&changes).expect("encodes");

        match writes.projects.as_slice() {
            [ProjectRowWrite::Update {
                status,
                expected_status,
                ..
            }] => {
                assert_eq!(status, "ARCHIVED");
                assert_eq!(expected_status, "ACTIVE");
            }
            _ => panic!("expected a guarded project update"),
        }
    }

    #[rstest]
    fn guarded_miss_is_a_conflict() {
        let id = Uuid::new_v4();
        let err = ensure_touched(0, "advance", id).expect_err("conflict");

        assert_eq!(
            commit_error(err),
            LedgerUnitOfWorkError::conflict(format!("advance {id} changed since it was read"))
        );
        assert!(ensure_touched(1, "advance", id).is_ok());
    }
}
