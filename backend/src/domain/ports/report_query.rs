//! Driving port for spreadsheet exports.

use async_trait::async_trait;

use super::ExportedFile;
use crate::domain::{Error, ExpenseId, ProjectId, SpendFilter, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportQuery: Send + Sync {
    /// Itemised sheet for one expense.
    async fn expense_invoice(
        &self,
        requester: &UserId,
        expense_id: &ExpenseId,
    ) -> Result<ExportedFile, Error>;

    /// Summary and detail sheets for one project.
    async fn project_archive(
        &self,
        requester: &UserId,
        project_id: &ProjectId,
    ) -> Result<ExportedFile, Error>;

    /// Approved spend per visible project.
    async fn spend_report(
        &self,
        requester: &UserId,
        filter: SpendFilter,
    ) -> Result<ExportedFile, Error>;
}
