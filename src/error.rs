use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CurationError>;

/// Fatal precondition and I/O failures. Missing image files are not errors; they are
/// collected in the validation report.
#[derive(Debug, Error)]
pub enum CurationError {
    #[error("Excel file not found: {}", .0.display())]
    SpreadsheetNotFound(PathBuf),
    #[error("Base directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("worksheet '{0}' not found in workbook")]
    SheetNotFound(String),
    #[error("workbook has no worksheets: {}", .0.display())]
    NoSheets(PathBuf),
    #[error("unsupported spreadsheet format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
