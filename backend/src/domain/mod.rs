//! Domain primitives, engines and services of the advance ledger.
//!
//! Purpose: model users, projects, cash advances, expenses and notifications
//! with their invariants; compute role-scoped visibility; run the advance,
//! expense and settlement state machines; and orchestrate them behind the
//! driving ports in [`ports`].
//!
//! Entities are immutable: every transition returns a new value, and
//! services collect the results in a [`LedgerChangeSet`] that is committed
//! atomically through [`ports::LedgerUnitOfWork`].

pub mod ports;

mod advance;
mod advance_service;
mod auth;
mod authority;
mod change_feed;
mod change_feed_service;
mod change_set;
mod directory_login;
pub mod error;
mod expense;
mod expense_service;
mod ids;
mod ledger_events;
mod ledger_service;
mod money;
mod notification;
mod notification_service;
mod policy;
mod project;
mod project_service;
mod receipt;
mod receipt_service;
mod report_service;
mod reports;
mod settlement;
mod settlement_service;
mod team_service;
mod trace_id;
mod user;
mod visibility;

#[cfg(test)]
pub(crate) mod ledger_test_helpers;
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use self::advance::{
    ADVANCE_TEXT_MAX, Advance, AdvanceDraft, AdvanceRecord, AdvanceState, AdvanceStatus,
    AdvanceTransitionError, AdvanceValidationError, CARRY_FORWARD_PREFIX, SettlementData,
};
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::authority::{
    FundingPolicy, can_edit_expense, can_fund, has_approval_authority, initial_advance_status,
};
pub use self::change_feed::{
    Alert, ChangeEvent, ChangeKind, ChangeSubject, ClientReaction, LedgerTable, react,
};
pub use self::change_feed_service::ChangeFeedService;
pub use self::change_set::{
    AdvanceGuard, AdvanceWrite, ExpenseGuard, ExpenseWrite, LedgerChangeSet, ProjectWrite,
    UserWrite,
};
pub use self::directory_login::DirectoryLoginService;
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::expense::{
    EXPENSE_TEXT_MAX, Expense, ExpenseBreakdown, ExpenseBreakdownDraft, ExpenseContent,
    ExpenseDraft, ExpenseRecord, ExpenseState, ExpenseStatus, ExpenseTransitionError,
    ExpenseValidationError, InvoiceItem, InvoiceItemDraft,
};
pub use self::ids::{AdvanceId, ExpenseId, IdValidationError, NotificationId, ProjectId, UserId};
pub use self::ledger_events::{LedgerEvent, notifications_for};
pub use self::ledger_service::LedgerService;
pub use self::money::{AMOUNT_SCALE, Amount, AmountError, round_cents};
pub use self::notification::{Notification, NotificationKind};
pub use self::notification_service::NotificationService;
pub use self::policy::LedgerPolicy;
pub use self::project::{
    PROJECT_TEXT_MAX, Project, ProjectDraft, ProjectStatus, ProjectTransitionError,
    ProjectValidationError,
};
pub use self::receipt::{
    RECEIPT_MAX_BYTES, ReceiptContentType, ReceiptUpload, ReceiptValidationError,
};
pub use self::receipt_service::ReceiptService;
pub use self::report_service::ReportService;
pub use self::reports::{
    AdvanceSpend, Cell, InvoiceContext, ProjectRecords, ProjectSpend, Sheet, SpendFilter,
    SpendReport, Workbook, invoice_workbook, project_archive_workbook,
};
pub use self::settlement::{
    SETTLEMENT_NOTES_MAX, SettlementError, SettlementOutcome, SettlementPreview, settle,
};
pub use self::team_service::ensure_admin;
pub use self::trace_id::TraceId;
pub use self::user::{
    ParseUserRoleError, RoleProfile, USER_NAME_MAX, User, UserDraft, UserRecord, UserRole,
    UserValidationError,
};
pub use self::visibility::{
    LedgerSnapshot, VisibilityPolicy, VisibilityScope, VisibleLedger, visible_ledger,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use advance_ledger::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
