//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`LedgerRepository`, `LedgerUnitOfWork`,
//! `NotificationRepository`, `ChangePublisher`, `ReceiptStorage`,
//! `WorkbookExporter`) are implemented by outbound adapters. Driving ports
//! (`*Command`, `*Query`, `LoginService`) are implemented by domain services
//! and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod advance_command;
mod change_feed_query;
mod change_publisher;
mod expense_command;
mod ledger_repository;
mod ledger_unit_of_work;
mod login_service;
mod notification_command;
mod notification_repository;
mod project_command;
mod receipt_command;
mod receipt_storage;
mod report_query;
mod settlement_command;
mod team_command;
mod workbook_exporter;
mod workspace_query;

#[cfg(test)]
pub use advance_command::MockAdvanceCommand;
pub use advance_command::{AdvanceCommand, CreateAdvanceRequest};
#[cfg(test)]
pub use change_feed_query::MockChangeFeedQuery;
pub use change_feed_query::{ChangeFeedQuery, ReactionStream};
#[cfg(test)]
pub use change_publisher::MockChangePublisher;
pub use change_publisher::{
    ChangePublisher, ChangePublisherError, ChangeStream, FixtureChangePublisher,
};
#[cfg(test)]
pub use expense_command::MockExpenseCommand;
pub use expense_command::{
    EditExpenseRequest, ExpenseBreakdownPayload, ExpenseCommand, ExpensePayload,
    InvoiceItemPayload, SubmitExpenseRequest,
};
#[cfg(test)]
pub use ledger_repository::MockLedgerRepository;
pub use ledger_repository::{
    FixtureLedgerRepository, LedgerRepository, LedgerRepositoryError, SnapshotScope,
};
#[cfg(test)]
pub use ledger_unit_of_work::MockLedgerUnitOfWork;
pub use ledger_unit_of_work::{FixtureLedgerUnitOfWork, LedgerUnitOfWork, LedgerUnitOfWorkError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{FIXTURE_USER_ID, FixtureLoginService, LoginService};
#[cfg(test)]
pub use notification_command::MockNotificationCommand;
pub use notification_command::NotificationCommand;
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{
    FixtureNotificationRepository, NotificationRepository, NotificationRepositoryError,
};
#[cfg(test)]
pub use project_command::MockProjectCommand;
pub use project_command::{CreateProjectRequest, ProjectCommand};
#[cfg(test)]
pub use receipt_command::MockReceiptCommand;
pub use receipt_command::ReceiptCommand;
#[cfg(test)]
pub use receipt_storage::MockReceiptStorage;
pub use receipt_storage::{
    FixtureReceiptStorage, ReceiptStorage, ReceiptStorageError, StoredReceipt,
};
#[cfg(test)]
pub use report_query::MockReportQuery;
pub use report_query::ReportQuery;
#[cfg(test)]
pub use settlement_command::MockSettlementCommand;
pub use settlement_command::{SettleAdvanceRequest, SettleAdvanceResponse, SettlementCommand};
#[cfg(test)]
pub use team_command::MockTeamCommand;
pub use team_command::{AddUserRequest, TeamCommand};
#[cfg(test)]
pub use workbook_exporter::MockWorkbookExporter;
pub use workbook_exporter::{ExportedFile, WorkbookExportError, WorkbookExporter};
#[cfg(test)]
pub use workspace_query::MockWorkspaceQuery;
pub use workspace_query::WorkspaceQuery;
