//! Existence checks for the AP/Lateral DICOM files referenced by each accession.
//!
//! Image cells may or may not carry the `.dcm` extension, so a value without it is tried
//! both with the extension appended and as written. Reports always name the file with the
//! extension. A missing file is a finding, not an error: the pass keeps going and the
//! caller decides the exit status from [`ValidationReport::missing_count`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::FileValidatorConfig;
use crate::data::{normalize, Dataset};
use crate::error::{CurationError, Result};
use crate::keys::ACCESSION_COLUMN;

pub const DICOM_EXTENSION: &str = ".dcm";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageColumn {
    Ap1,
    Ap2,
    Ap3,
    Lateral1,
    Lateral2,
    Lateral3,
}

impl ImageColumn {
    pub const ALL: [ImageColumn; 6] = [
        Self::Ap1,
        Self::Ap2,
        Self::Ap3,
        Self::Lateral1,
        Self::Lateral2,
        Self::Lateral3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ap1 => "AP_1",
            Self::Ap2 => "AP_2",
            Self::Ap3 => "AP_3",
            Self::Lateral1 => "Lateral_1",
            Self::Lateral2 => "Lateral_2",
            Self::Lateral3 => "Lateral_3",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ImageColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn has_dicom_extension(value: &str) -> bool {
    value.to_ascii_lowercase().ends_with(DICOM_EXTENSION)
}

/// Paths to probe for one image cell, in order.
pub fn candidate_paths(base_dir: &Path, accession: &str, value: &str) -> Vec<PathBuf> {
    let accession_dir = base_dir.join(accession);
    if has_dicom_extension(value) {
        vec![accession_dir.join(value)]
    } else {
        vec![
            accession_dir.join(format!("{value}{DICOM_EXTENSION}")),
            accession_dir.join(value),
        ]
    }
}

/// File name reported for an image cell, with the `.dcm` extension enforced.
pub fn display_name(value: &str) -> String {
    let with_extension = if has_dicom_extension(value) {
        value.to_string()
    } else {
        format!("{value}{DICOM_EXTENSION}")
    };
    Path::new(&with_extension)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(with_extension)
}

/// One line of the found-files table. Field order is the CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationRow {
    #[serde(rename = "Accession")]
    pub accession: String,
    #[serde(rename = "AP_1")]
    pub ap_1: String,
    #[serde(rename = "AP_2")]
    pub ap_2: String,
    #[serde(rename = "AP_3")]
    pub ap_3: String,
    #[serde(rename = "Lateral_1")]
    pub lateral_1: String,
    #[serde(rename = "Lateral_2")]
    pub lateral_2: String,
    #[serde(rename = "Lateral_3")]
    pub lateral_3: String,
}

impl ValidationRow {
    pub fn new(accession: impl Into<String>) -> Self {
        Self {
            accession: accession.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, column: ImageColumn) -> &str {
        match column {
            ImageColumn::Ap1 => &self.ap_1,
            ImageColumn::Ap2 => &self.ap_2,
            ImageColumn::Ap3 => &self.ap_3,
            ImageColumn::Lateral1 => &self.lateral_1,
            ImageColumn::Lateral2 => &self.lateral_2,
            ImageColumn::Lateral3 => &self.lateral_3,
        }
    }

    pub fn set(&mut self, column: ImageColumn, file_name: String) {
        let slot = match column {
            ImageColumn::Ap1 => &mut self.ap_1,
            ImageColumn::Ap2 => &mut self.ap_2,
            ImageColumn::Ap3 => &mut self.ap_3,
            ImageColumn::Lateral1 => &mut self.lateral_1,
            ImageColumn::Lateral2 => &mut self.lateral_2,
            ImageColumn::Lateral3 => &mut self.lateral_3,
        };
        *slot = file_name;
    }

    pub fn found_count(&self) -> usize {
        ImageColumn::ALL
            .iter()
            .filter(|column| !self.get(**column).is_empty())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFile {
    pub accession: String,
    pub column: ImageColumn,
    pub display_name: String,
}

impl fmt::Display for MissingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing file for Accession {} ({}): {}",
            self.accession, self.column, self.display_name
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub rows: Vec<ValidationRow>,
    /// In the order they were encountered.
    pub missing: Vec<MissingFile>,
    /// Non-blank image cells, found or not.
    pub checked_count: usize,
}

impl ValidationReport {
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    pub fn found_count(&self) -> usize {
        self.rows.iter().map(ValidationRow::found_count).sum()
    }

    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    /// Writes the found-files table. Column order is fixed by [`ValidationRow`].
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub fn required_columns() -> Vec<&'static str> {
    std::iter::once(ACCESSION_COLUMN)
        .chain(ImageColumn::ALL.iter().map(ImageColumn::as_str))
        .collect()
}

/// Checks every non-blank image cell of every row with a non-blank accession.
pub fn validate(dataset: &Dataset, base_dir: &Path) -> Result<ValidationReport> {
    dataset.require_columns(&required_columns())?;
    if !base_dir.exists() {
        return Err(CurationError::DirectoryNotFound(base_dir.to_path_buf()));
    }

    let accession_idx = dataset.column_index(ACCESSION_COLUMN).unwrap_or_default();
    let mut image_idx = [0usize; 6];
    for column in ImageColumn::ALL {
        image_idx[column.index()] = dataset.column_index(column.as_str()).unwrap_or_default();
    }

    let mut report = ValidationReport::default();
    for row in 0..dataset.len() {
        let accession = normalize(dataset.cell(row, accession_idx));
        if accession.is_empty() {
            continue;
        }
        let mut out = ValidationRow::new(accession.clone());

        for column in ImageColumn::ALL {
            let value = normalize(dataset.cell(row, image_idx[column.index()]));
            if value.is_empty() {
                continue;
            }
            report.checked_count += 1;
            let name = display_name(&value);
            let found = candidate_paths(base_dir, &accession, &value)
                .iter()
                .any(|path| path.exists());
            if found {
                tracing::debug!(accession = %accession, %column, file = %name, "found");
                out.set(column, name);
            } else {
                tracing::debug!(accession = %accession, %column, file = %name, "missing");
                report.missing.push(MissingFile {
                    accession: accession.clone(),
                    column,
                    display_name: name,
                });
            }
        }

        report.rows.push(out);
    }

    tracing::info!(
        rows = report.rows.len(),
        checked = report.checked_count,
        missing = report.missing_count(),
        "validated image references"
    );
    Ok(report)
}

/// Loads the configured spreadsheet, validates it, and writes the found-files table when
/// at least one accession was processed.
pub fn check_files(config: &FileValidatorConfig) -> Result<ValidationReport> {
    if !config.spreadsheet.exists() {
        return Err(CurationError::SpreadsheetNotFound(config.spreadsheet.clone()));
    }
    if !config.base_dir.exists() {
        return Err(CurationError::DirectoryNotFound(config.base_dir.clone()));
    }

    let dataset = Dataset::load(&config.spreadsheet, config.sheet.as_deref())?;
    let report = validate(&dataset, &config.base_dir)?;
    if !report.rows.is_empty() {
        report.write_csv(&config.out_csv)?;
    }
    Ok(report)
}
