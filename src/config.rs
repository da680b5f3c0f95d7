//! Run settings for both tools. Built from command-line arguments at the process boundary;
//! nothing here carries a site-specific default path.

use std::path::PathBuf;

use crate::keys::DEFAULT_KEY_COLUMN;

pub const DEFAULT_OUT_CSV: &str = "found_files.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAssignerConfig {
    /// Spreadsheet updated in place.
    pub spreadsheet: PathBuf,
    pub key_column: String,
    /// Worksheet to read; the first one when unset.
    pub sheet: Option<String>,
}

impl KeyAssignerConfig {
    pub fn new(spreadsheet: impl Into<PathBuf>) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            sheet: None,
        }
    }

    pub fn with_key_column(mut self, key_column: impl Into<String>) -> Self {
        self.key_column = key_column.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidatorConfig {
    pub spreadsheet: PathBuf,
    /// Holds one folder per accession.
    pub base_dir: PathBuf,
    pub out_csv: PathBuf,
    pub sheet: Option<String>,
}

impl FileValidatorConfig {
    pub fn new(spreadsheet: impl Into<PathBuf>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            base_dir: base_dir.into(),
            out_csv: PathBuf::from(DEFAULT_OUT_CSV),
            sheet: None,
        }
    }

    pub fn with_out_csv(mut self, out_csv: impl Into<PathBuf>) -> Self {
        self.out_csv = out_csv.into();
        self
    }
}
