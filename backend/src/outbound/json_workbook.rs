//! Renders report workbooks as JSON documents.

use crate::domain::Workbook;
use crate::domain::ports::{ExportedFile, WorkbookExportError, WorkbookExporter};

/// Emits `{fileStem, sheets: [{name, rows}]}` with typed cells.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWorkbookExporter;

impl WorkbookExporter for JsonWorkbookExporter {
    fn render(&self, workbook: &Workbook) -> Result<ExportedFile, WorkbookExportError> {
        let bytes = serde_json::to_vec_pretty(workbook)
            .map_err(|err| WorkbookExportError::render(err.to_string()))?;
        Ok(ExportedFile {
            file_name: format!("{}.json", workbook.file_stem()),
            content_type: "application/json".to_owned(),
            bytes,
        })
    }
}
