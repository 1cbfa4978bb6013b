//! PostgreSQL-backed `LedgerRepository`.
//!
//! Snapshots read every table inside one transaction so the users,
//! projects, advances and expenses returned all come from the same MVCC
//! view.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::error;
use uuid::Uuid;

use crate::domain::ports::{LedgerRepository, LedgerRepositoryError, SnapshotScope};
use crate::domain::{LedgerSnapshot, User, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AdvanceRow, ExpenseRow, ProjectRow, RowDecodeError, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{advances, expenses, projects, users};

/// Diesel implementation of the ledger read port.
#[derive(Clone)]
pub struct DieselLedgerRepository {
    pool: DbPool,
}

impl DieselLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> LedgerRepositoryError {
    map_pool_error(error, |message| LedgerRepositoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> LedgerRepositoryError {
    map_diesel_error(
        error,
        LedgerRepositoryError::query,
        LedgerRepositoryError::connection,
    )
}

fn decode_rows<Row, T>(rows: Vec<Row>) -> Result<Vec<T>, LedgerRepositoryError>
where
    T: TryFrom<Row, Error = RowDecodeError>,
{
    rows.into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            error!(error = %err, "stored ledger row failed validation");
            LedgerRepositoryError::query(err.to_string())
        })
}

struct SnapshotRows {
    users: Vec<UserRow>,
    projects: Vec<ProjectRow>,
    advances: Vec<AdvanceRow>,
    expenses: Vec<ExpenseRow>,
}

impl SnapshotRows {
    fn decode(self) -> Result<LedgerSnapshot, LedgerRepositoryError> {
        Ok(LedgerSnapshot {
            users: decode_rows(self.users)?,
            projects: decode_rows(self.projects)?,
            advances: decode_rows(self.advances)?,
            expenses: decode_rows(self.expenses)?,
        })
    }
}

async fn load_everything(conn: &mut AsyncPgConnection) -> QueryResult<SnapshotRows> {
    let users = users::table
        .select(UserRow::as_select())
        .order_by(users::created_at)
        .load(conn)
        .await?;
    let projects = projects::table
        .select(ProjectRow::as_select())
        .order_by(projects::created_at)
        .load(conn)
        .await?;
    let advances = advances::table
        .select(AdvanceRow::as_select())
        .order_by(advances::created_at)
        .load(conn)
        .await?;
    let expenses = expenses::table
        .select(ExpenseRow::as_select())
        .order_by(expenses::created_at)
        .load(conn)
        .await?;
    Ok(SnapshotRows {
        users,
        projects,
        advances,
        expenses,
    })
}

/// The root admin, everyone under them, their projects, and the advances
/// and expenses booked against those projects.
async fn load_tenant(conn: &mut AsyncPgConnection, root: Uuid) -> QueryResult<SnapshotRows> {
    let users = users::table
        .filter(users::id.eq(root))
        .or_filter(users::root_admin_id.eq(root))
        .select(UserRow::as_select())
        .order_by(users::created_at)
        .load(conn)
        .await?;
    let projects: Vec<ProjectRow> = projects::table
        .filter(projects::manager_id.eq(root))
        .select(ProjectRow::as_select())
        .order_by(projects::created_at)
        .load(conn)
        .await?;
    let project_ids: Vec<Uuid> = projects.iter().map(|row| row.id).collect();
    let advances: Vec<AdvanceRow> = advances::table
        .filter(advances::project_id.eq_any(project_ids))
        .select(AdvanceRow::as_select())
        .order_by(advances::created_at)
        .load(conn)
        .await?;
    let advance_ids: Vec<Uuid> = advances.iter().map(|row| row.id).collect();
    let expenses = expenses::table
        .filter(expenses::advance_id.eq_any(advance_ids))
        .select(ExpenseRow::as_select())
        .order_by(expenses::created_at)
        .load(conn)
        .await?;
    Ok(SnapshotRows {
        users,
        projects,
        advances,
        expenses,
    })
}

#[async_trait]
impl LedgerRepository for DieselLedgerRepository {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(decode_rows(row.into_iter().collect())?.pop())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .limit(1)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(decode_rows(rows)?.pop())
    }

    async fn load_snapshot(
        &self,
        scope: SnapshotScope,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = conn
            .transaction(|conn| {
                async move {
                    match scope {
                        SnapshotScope::All => load_everything(conn).await,
                        SnapshotScope::Tenant(root) => load_tenant(conn, *root.as_uuid()).await,
                    }
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error)?;
        rows.decode()
    }
}
