//! Spreadsheet exports over the requester's visible ledger.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mockable::Clock;
use tracing::debug;

use crate::domain::ledger_service::{Workspace, load_workspace};
use crate::domain::ports::{
    ExportedFile, LedgerRepository, ReportQuery, WorkbookExportError, WorkbookExporter,
};
use crate::domain::{
    Error, ExpenseId, InvoiceContext, LedgerPolicy, ProjectId, ProjectRecords, SpendFilter,
    SpendReport, UserId, Workbook, invoice_workbook, project_archive_workbook, visible_ledger,
};

fn map_export_error(error: WorkbookExportError) -> Error {
    match error {
        WorkbookExportError::Render { message } => {
            Error::internal(format!("report rendering failed: {message}"))
        }
    }
}

/// Builds report workbooks and hands them to an exporter.
pub struct ReportService<R, X> {
    repo: Arc<R>,
    exporter: Arc<X>,
    clock: Arc<dyn Clock>,
    policy: LedgerPolicy,
}

impl<R, X> ReportService<R, X> {
    pub fn new(repo: Arc<R>, exporter: Arc<X>, clock: Arc<dyn Clock>, policy: LedgerPolicy) -> Self {
        Self {
            repo,
            exporter,
            clock,
            policy,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }
}

impl<R, X> ReportService<R, X>
where
    R: LedgerRepository,
    X: WorkbookExporter,
{
    async fn workspace(&self, requester: &UserId) -> Result<Workspace, Error> {
        load_workspace(self.repo.as_ref(), requester, self.policy).await
    }

    fn render(&self, workbook: &Workbook) -> Result<ExportedFile, Error> {
        let file = self.exporter.render(workbook).map_err(map_export_error)?;
        debug!(file = %file.file_name, bytes = file.bytes.len(), "report rendered");
        Ok(file)
    }
}

#[async_trait]
impl<R, X> ReportQuery for ReportService<R, X>
where
    R: LedgerRepository,
    X: WorkbookExporter,
{
    async fn expense_invoice(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
    ) -> Result<ExportedFile, Error> {
        let workspace = self.workspace(requester).await?;
        let expense = workspace.visible_expense(*expense_id)?;
        let advance = workspace.advance_of(expense)?;
        let project = workspace
            .snapshot()
            .projects
            .iter()
            .find(|project| project.id() == advance.project_id());
        let workbook = invoice_workbook(
            expense,
            InvoiceContext {
                advance: Some(advance),
                project,
                owner: workspace.user(expense.user_id()),
            },
        );
        self.render(&workbook)
    }

    async fn project_archive(
        &self,
        requester: &UserId,
        project_id: &ProjectId,
    ) -> Result<ExportedFile, Error> {
        let workspace = self.workspace(requester).await?;
        let project = workspace.visible_project(*project_id)?;
        let visible = visible_ledger(
            workspace.requester(),
            workspace.snapshot(),
            self.policy.visibility,
        );
        let advances: Vec<_> = visible
            .advances
            .into_iter()
            .filter(|advance| advance.project_id() == project.id())
            .collect();
        let expenses: Vec<_> = visible
            .expenses
            .into_iter()
            .filter(|expense| {
                advances
                    .iter()
                    .any(|advance| advance.id() == expense.advance_id())
            })
            .collect();
        let workbook = project_archive_workbook(
            ProjectRecords {
                project,
                advances: &advances,
                expenses: &expenses,
                users: &workspace.snapshot().users,
            },
            self.today(),
        );
        self.render(&workbook)
    }

    async fn spend_report(
        &self,
        requester: &UserId,
        filter: SpendFilter,
    ) -> Result<ExportedFile, Error> {
        let workspace = self.workspace(requester).await?;
        let visible = visible_ledger(
            workspace.requester(),
            workspace.snapshot(),
            self.policy.visibility,
        );
        let report = SpendReport::build(&visible, filter);
        self.render(&report.to_workbook(self.today(), filter))
    }
}
