//! Diesel row structs for the ledger tables.
//!
//! Rows stay inside the persistence adapter. Conversions to domain entities
//! go through the domain's flat record types so the entity constructors
//! re-validate everything read from storage.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{advances, expenses, notifications, projects, users};
use crate::domain::{
    Advance, AdvanceRecord, AdvanceStatus, Amount, Expense, ExpenseRecord, ExpenseStatus,
    InvoiceItem, Notification, NotificationKind, Project, ProjectDraft, ProjectStatus,
    SettlementData, User, UserRecord, UserRole,
};

/// Failure turning a stored row into a domain entity.
#[derive(Debug, thiserror::Error)]
#[error("corrupt {table} row {id}: {message}")]
pub(crate) struct RowDecodeError {
    table: &'static str,
    id: Uuid,
    message: String,
}

impl RowDecodeError {
    fn new(table: &'static str, id: Uuid, message: impl ToString) -> Self {
        Self {
            table,
            id,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub manager_id: Option<Uuid>,
    pub root_admin_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        let record = UserRecord::from(user.clone());
        Self {
            id: *record.id.as_uuid(),
            name: record.name,
            email: record.email,
            role: record.role.as_str().to_owned(),
            manager_id: record.manager_id.map(|id| *id.as_uuid()),
            root_admin_id: record.root_admin_id.map(|id| *id.as_uuid()),
            job_title: record.job_title,
            phone: record.phone,
            avatar_url: record.avatar_url,
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = RowDecodeError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let role: UserRole = row
            .role
            .parse()
            .map_err(|err| RowDecodeError::new("users", id, err))?;
        Self::try_from(UserRecord {
            id: row.id.into(),
            name: row.name,
            email: row.email,
            role,
            manager_id: row.manager_id.map(Into::into),
            root_admin_id: row.root_admin_id.map(Into::into),
            job_title: row.job_title,
            phone: row.phone,
            avatar_url: row.avatar_url,
        })
        .map_err(|err| RowDecodeError::new("users", id, err))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub manager_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: *project.id().as_uuid(),
            name: project.name().to_owned(),
            location: project.location().to_owned(),
            manager_id: *project.manager_id().as_uuid(),
            status: project.status().as_str().to_owned(),
            created_at: project.created_at(),
        }
    }
}

impl TryFrom<ProjectRow> for Project {
    type Error = RowDecodeError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let status: ProjectStatus = row
            .status
            .parse()
            .map_err(|err: String| RowDecodeError::new("projects", id, err))?;
        Self::new(ProjectDraft {
            id: row.id.into(),
            name: row.name,
            location: row.location,
            manager_id: row.manager_id.into(),
            status,
            created_at: row.created_at,
        })
        .map_err(|err| RowDecodeError::new("projects", id, err))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = advances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AdvanceRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub created_by: Uuid,
    pub amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: String,
    pub description: String,
    pub date: NaiveDate,
    pub settlement_data: Option<serde_json::Value>,
    pub rejection_reason: Option<String>,
    pub origin_advance_id: Option<Uuid>,
}

/// Columns an advance transition may change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = advances)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AdvanceUpdate {
    pub remaining_amount: Decimal,
    pub status: String,
    pub settlement_data: Option<serde_json::Value>,
    pub rejection_reason: Option<String>,
}

impl TryFrom<&Advance> for AdvanceRow {
    type Error = serde_json::Error;

    fn try_from(advance: &Advance) -> Result<Self, Self::Error> {
        let record = AdvanceRecord::from(advance.clone());
        let settlement_data = record
            .settlement_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        Ok(Self {
            id: *record.id.as_uuid(),
            project_id: *record.project_id.as_uuid(),
            user_id: *record.user_id.as_uuid(),
            created_by: *record.created_by.as_uuid(),
            amount: record.amount.value(),
            remaining_amount: record.remaining_amount,
            status: record.status.as_str().to_owned(),
            description: record.description,
            date: record.date,
            settlement_data,
            rejection_reason: record.rejection_reason,
            origin_advance_id: record.origin_advance_id.map(|id| *id.as_uuid()),
        })
    }
}

impl From<AdvanceRow> for AdvanceUpdate {
    fn from(row: AdvanceRow) -> Self {
        Self {
            remaining_amount: row.remaining_amount,
            status: row.status,
            settlement_data: row.settlement_data,
            rejection_reason: row.rejection_reason,
        }
    }
}

impl TryFrom<AdvanceRow> for Advance {
    type Error = RowDecodeError;

    fn try_from(row: AdvanceRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let decode = |err: &dyn std::fmt::Display| RowDecodeError::new("advances", id, err);
        let status: AdvanceStatus = row.status.parse().map_err(|err: String| decode(&err))?;
        let amount = Amount::try_from(row.amount).map_err(|err| decode(&err))?;
        let settlement_data: Option<SettlementData> = row
            .settlement_data
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| decode(&err))?;
        Self::try_from(AdvanceRecord {
            id: row.id.into(),
            project_id: row.project_id.into(),
            user_id: row.user_id.into(),
            created_by: row.created_by.into(),
            amount,
            remaining_amount: row.remaining_amount,
            status,
            description: row.description,
            date: row.date,
            settlement_data,
            rejection_reason: row.rejection_reason,
            origin_advance_id: row.origin_advance_id.map(Into::into),
        })
        .map_err(|err| decode(&err))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = expenses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ExpenseRow {
    pub id: Uuid,
    pub advance_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub base_amount: Option<Decimal>,
    pub additional_amount: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub date: NaiveDate,
    pub status: String,
    pub is_editable: bool,
    pub is_invoice: bool,
    pub invoice_items: serde_json::Value,
    pub rejection_reason: Option<String>,
}

/// Every mutable expense column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = expenses)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ExpenseUpdate {
    pub amount: Decimal,
    pub base_amount: Option<Decimal>,
    pub additional_amount: Decimal,
    pub description: String,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub date: NaiveDate,
    pub status: String,
    pub is_editable: bool,
    pub is_invoice: bool,
    pub invoice_items: serde_json::Value,
    pub rejection_reason: Option<String>,
}

impl TryFrom<&Expense> for ExpenseRow {
    type Error = serde_json::Error;

    fn try_from(expense: &Expense) -> Result<Self, Self::Error> {
        let record = ExpenseRecord::from(expense.clone());
        Ok(Self {
            id: *record.id.as_uuid(),
            advance_id: *record.advance_id.as_uuid(),
            user_id: *record.user_id.as_uuid(),
            amount: record.amount.value(),
            base_amount: record.base_amount.map(|amount| amount.value()),
            additional_amount: record.additional_amount.value(),
            description: record.description,
            notes: record.notes,
            image_url: record.image_url,
            date: record.date,
            status: record.status.as_str().to_owned(),
            is_editable: record.is_editable,
            is_invoice: record.is_invoice,
            invoice_items: serde_json::to_value(&record.invoice_items)?,
            rejection_reason: record.rejection_reason,
        })
    }
}

impl From<ExpenseRow> for ExpenseUpdate {
    fn from(row: ExpenseRow) -> Self {
        Self {
            amount: row.amount,
            base_amount: row.base_amount,
            additional_amount: row.additional_amount,
            description: row.description,
            notes: row.notes,
            image_url: row.image_url,
            date: row.date,
            status: row.status,
            is_editable: row.is_editable,
            is_invoice: row.is_invoice,
            invoice_items: row.invoice_items,
            rejection_reason: row.rejection_reason,
        }
    }
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = RowDecodeError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let decode = |err: &dyn std::fmt::Display| RowDecodeError::new("expenses", id, err);
        let status: ExpenseStatus = row.status.parse().map_err(|err: String| decode(&err))?;
        let amount = Amount::try_from(row.amount).map_err(|err| decode(&err))?;
        let base_amount = row
            .base_amount
            .map(Amount::try_from)
            .transpose()
            .map_err(|err| decode(&err))?;
        let additional_amount =
            Amount::try_from(row.additional_amount).map_err(|err| decode(&err))?;
        let invoice_items: Vec<InvoiceItem> =
            serde_json::from_value(row.invoice_items).map_err(|err| decode(&err))?;
        Self::try_from(ExpenseRecord {
            id: row.id.into(),
            advance_id: row.advance_id.into(),
            user_id: row.user_id.into(),
            amount,
            base_amount,
            additional_amount,
            description: row.description,
            notes: row.notes,
            image_url: row.image_url,
            date: row.date,
            status,
            is_editable: row.is_editable,
            is_invoice: row.is_invoice,
            invoice_items,
            rejection_reason: row.rejection_reason,
        })
        .map_err(|err| decode(&err))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationRow {
    fn from(notification: &Notification) -> Self {
        Self {
            id: *notification.id().as_uuid(),
            user_id: *notification.user_id().as_uuid(),
            message: notification.message().to_owned(),
            kind: notification.kind().as_str().to_owned(),
            is_read: notification.is_read(),
            created_at: notification.created_at(),
        }
    }
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RowDecodeError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind: NotificationKind = row
            .kind
            .parse()
            .map_err(|err: String| RowDecodeError::new("notifications", row.id, err))?;
        Ok(Self::restore(
            row.id.into(),
            row.user_id.into(),
            kind,
            row.message,
            row.is_read,
            row.created_at,
        ))
    }
}

#[cfg(test)]
mod tests {
    //! Row conversions must survive a store and reload unchanged.
    use super::*;
    use crate::domain::settle;
    use crate::domain::test_fixtures::{admin, advance, amount, engineer, expense, project, today};
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    fn engineer_rows_keep_the_hierarchy() {
        let owner = admin("Noura");
        let faisal = engineer("Faisal", &owner);

        let restored = User::try_from(UserRow::from(&faisal)).expect("decodes");

        assert_eq!(restored, faisal);
    }

    #[rstest]
    fn unknown_role_is_a_decode_error() {
        let mut row = UserRow::from(&admin("Noura"));
        row.role = "AUDITOR".to_owned();

        let err = User::try_from(row).expect_err("bad role");

        assert!(err.to_string().contains("users"));
    }

    fn closed_advance() -> Advance {
        let owner = admin("Noura");
        let site = project(&owner, ProjectStatus::Active);
        let open = advance(&site, &owner, 800, AdvanceStatus::Open);
        settle(&open, &[], amount(800), Some("all returned".to_owned()), today())
            .expect("settles")
            .closed
    }

    #[rstest]
    fn settled_advance_keeps_its_settlement() {
        let closed = closed_advance();

        let row = AdvanceRow::try_from(&closed).expect("encodes");
        assert!(row.settlement_data.is_some());

        let restored = Advance::try_from(row).expect("decodes");
        assert_eq!(restored, closed);
    }

    #[rstest]
    fn closed_row_without_settlement_is_rejected() {
        let mut row = AdvanceRow::try_from(&closed_advance()).expect("row");
        row.settlement_data = None;

        assert!(Advance::try_from(row).is_err());
    }

    #[rstest]
    fn expense_total_is_recomputed_on_load() {
        let owner = admin("Noura");
        let site = project(&owner, ProjectStatus::Active);
        let spent = expense(&advance(&site, &owner, 800, AdvanceStatus::Open), 45);
        let mut row = ExpenseRow::try_from(&spent).expect("row");
        row.amount = Decimal::from(9_999);

        let restored = Expense::try_from(row).expect("decodes");

        assert_eq!(restored.amount(), spent.amount());
    }

    #[rstest]
    fn notification_rows_keep_the_kind() {
        let note = Notification::new(
            admin("Noura").id(),
            NotificationKind::Warning,
            "Debt carried forward",
            Utc::now(),
        );

        let restored = Notification::try_from(NotificationRow::from(&note)).expect("decodes");

        assert_eq!(restored, note);
    }
}
