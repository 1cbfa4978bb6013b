//! Port for rendering report workbooks into downloadable files.

use crate::domain::Workbook;

use super::define_port_error;

define_port_error! {
    /// Errors raised while rendering a workbook.
    pub enum WorkbookExportError {
        Render { message: String } => "workbook rendering failed: {message}",
    }
}

/// A rendered file ready to send to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Renders a [`Workbook`] in some spreadsheet-like format.
#[cfg_attr(test, mockall::automock)]
pub trait WorkbookExporter: Send + Sync {
    fn render(&self, workbook: &Workbook) -> Result<ExportedFile, WorkbookExportError>;
}
