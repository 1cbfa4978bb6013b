//! Shared HTTP adapter state.
//!
//! Handlers receive this state via `actix_web::web::Data` and only see the
//! driving ports, so they can be exercised with mocks and no I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AdvanceCommand, ExpenseCommand, LoginService, NotificationCommand, ProjectCommand,
    ReceiptCommand, ReportQuery, SettlementCommand, TeamCommand, WorkspaceQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub workspace: Arc<dyn WorkspaceQuery>,
    pub team: Arc<dyn TeamCommand>,
    pub projects: Arc<dyn ProjectCommand>,
    pub advances: Arc<dyn AdvanceCommand>,
    pub settlements: Arc<dyn SettlementCommand>,
    pub expenses: Arc<dyn ExpenseCommand>,
    pub reports: Arc<dyn ReportQuery>,
    pub receipts: Arc<dyn ReceiptCommand>,
    pub notifications: Arc<dyn NotificationCommand>,
}

impl HttpState {
    /// Route every ledger port to one service value.
    ///
    /// `LedgerService` implements all ledger commands and the workspace
    /// query, so the server shares a single instance between them.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use advance_ledger::domain::ports::{
    ///     FixtureChangePublisher, FixtureLedgerRepository, FixtureLedgerUnitOfWork,
    ///     FixtureLoginService, FixtureNotificationRepository, FixtureReceiptStorage,
    /// };
    /// use advance_ledger::domain::{
    ///     LedgerService, NotificationService, ReceiptService, ReportService,
    /// };
    /// use advance_ledger::inbound::http::state::{HttpState, SidePorts};
    /// use advance_ledger::outbound::JsonWorkbookExporter;
    /// use mockable::DefaultClock;
    ///
    /// let repo = Arc::new(FixtureLedgerRepository);
    /// let ledger = Arc::new(LedgerService::new(
    ///     repo.clone(),
    ///     Arc::new(FixtureLedgerUnitOfWork),
    ///     Arc::new(FixtureChangePublisher),
    ///     Arc::new(DefaultClock),
    ///     Default::default(),
    /// ));
    /// let state = HttpState::from_ledger(
    ///     ledger,
    ///     SidePorts {
    ///         login: Arc::new(FixtureLoginService),
    ///         reports: Arc::new(ReportService::new(
    ///             repo,
    ///             Arc::new(JsonWorkbookExporter),
    ///             Arc::new(DefaultClock),
    ///             Default::default(),
    ///         )),
    ///         receipts: Arc::new(ReceiptService::new(Arc::new(FixtureReceiptStorage))),
    ///         notifications: Arc::new(NotificationService::new(
    ///             Arc::new(FixtureNotificationRepository),
    ///             Arc::new(FixtureChangePublisher),
    ///         )),
    ///     },
    /// );
    /// let _workspace = state.workspace.clone();
    /// ```
    pub fn from_ledger<L>(ledger: Arc<L>, side: SidePorts) -> Self
    where
        L: WorkspaceQuery
            + TeamCommand
            + ProjectCommand
            + AdvanceCommand
            + SettlementCommand
            + ExpenseCommand
            + 'static,
    {
        let SidePorts {
            login,
            reports,
            receipts,
            notifications,
        } = side;
        Self {
            login,
            workspace: ledger.clone(),
            team: ledger.clone(),
            projects: ledger.clone(),
            advances: ledger.clone(),
            settlements: ledger.clone(),
            expenses: ledger,
            reports,
            receipts,
            notifications,
        }
    }
}

/// Ports served by something other than the ledger service.
#[derive(Clone)]
pub struct SidePorts {
    pub login: Arc<dyn LoginService>,
    pub reports: Arc<dyn ReportQuery>,
    pub receipts: Arc<dyn ReceiptCommand>,
    pub notifications: Arc<dyn NotificationCommand>,
}
