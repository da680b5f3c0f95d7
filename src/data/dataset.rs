//! In-memory spreadsheet: a header row plus records, loaded in full and written back whole.

use std::path::Path;

use calamine::Reader;
use rust_xlsxwriter::{Format, Workbook};

use crate::data::cell::{datetime_to_serial, CellValue};
use crate::error::{CurationError, Result};

static EMPTY_CELL: CellValue = CellValue::Empty;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Csv,
    Xlsx,
    /// Legacy or foreign workbooks calamine can read but we cannot write back.
    ReadOnlyWorkbook,
}

impl SpreadsheetFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx") => Ok(Self::Xlsx),
            Some("xlsm" | "xlsb" | "xls" | "ods") => Ok(Self::ReadOnlyWorkbook),
            _ => Err(CurationError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Self::ReadOnlyWorkbook)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    sheet_name: Option<String>,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            sheet_name: None,
        }
    }

    /// Reads the whole first (or named) worksheet, or a CSV file. The first row is the header.
    pub fn load(path: &Path, sheet: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Err(CurationError::SpreadsheetNotFound(path.to_path_buf()));
        }
        let dataset = match SpreadsheetFormat::from_path(path)? {
            SpreadsheetFormat::Csv => read_csv(path)?,
            SpreadsheetFormat::Xlsx | SpreadsheetFormat::ReadOnlyWorkbook => {
                read_workbook(path, sheet)?
            }
        };
        tracing::debug!(
            path = %path.display(),
            columns = dataset.columns.len(),
            rows = dataset.rows.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Replaces `path` with the dataset contents. No backup is kept.
    pub fn save(&self, path: &Path) -> Result<()> {
        match SpreadsheetFormat::from_path(path)? {
            SpreadsheetFormat::Csv => write_csv(self, path)?,
            SpreadsheetFormat::Xlsx => write_xlsx(self, path)?,
            SpreadsheetFormat::ReadOnlyWorkbook => {
                return Err(CurationError::UnsupportedFormat(path.to_path_buf()))
            }
        }
        tracing::debug!(path = %path.display(), rows = self.rows.len(), "saved dataset");
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.sheet_name.as_deref()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Fails with every absent column name, sorted.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let mut missing: Vec<String> = names
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(CurationError::MissingColumns(missing))
    }

    /// Index of `name`, appending an all-empty column when it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        self.columns.len() - 1
    }

    /// Appends a record, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        if cells.len() > self.columns.len() {
            tracing::warn!(
                row = self.rows.len(),
                extra = cells.len() - self.columns.len(),
                "dropping cells beyond the header width"
            );
        }
        cells.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(cells);
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        if let Some(slot) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *slot = value;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

fn cell_from_data(data: &calamine::Data) -> CellValue {
    match data {
        calamine::Data::Empty | calamine::Data::Error(_) => CellValue::Empty,
        calamine::Data::String(s) => CellValue::from_raw(s),
        calamine::Data::Float(f) => CellValue::Float(*f),
        calamine::Data::Int(i) => CellValue::Int(*i),
        calamine::Data::Bool(b) => CellValue::Bool(*b),
        calamine::Data::DateTime(dt) if dt.is_duration() => CellValue::Float(dt.as_f64()),
        calamine::Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        calamine::Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::from_raw(s)),
        other => CellValue::Text(other.to_string()),
    }
}

/// Serial number for the ISO dates some workbook formats (ods) store as text.
fn parse_iso_datetime(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let dt = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    datetime_to_serial(dt)
}

/// Header text is trimmed only; a column may legitimately be called "nan".
fn header_name(data: &calamine::Data) -> String {
    cell_from_data(data).to_string().trim().to_string()
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Dataset> {
    let mut workbook = calamine::open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|name| name.as_str() == wanted)
            .cloned()
            .ok_or_else(|| CurationError::SheetNotFound(wanted.to_string()))?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| CurationError::NoSheets(path.to_path_buf()))?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let columns: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(header_name).collect())
        .unwrap_or_default();
    let mut dataset = Dataset::new(columns);
    dataset.sheet_name = Some(sheet_name);
    for row in rows {
        dataset.push_row(row.iter().map(cell_from_data).collect());
    }
    Ok(dataset)
}

fn read_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut dataset = Dataset::new(columns);
    for result in reader.records() {
        let record = result?;
        dataset.push_row(record.iter().map(CellValue::from_raw).collect());
    }
    Ok(dataset)
}

fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&dataset.columns)?;
    for row in &dataset.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(dataset: &Dataset, path: &Path) -> Result<()> {
    let date_format = Format::new().set_num_format(DATE_FORMAT);
    let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    if let Some(name) = dataset.sheet_name() {
        worksheet.set_name(name)?;
    }

    for (col, name) in dataset.columns.iter().enumerate() {
        worksheet.write_string(0, col_num(col), name.as_str())?;
    }
    for (r, row) in dataset.rows.iter().enumerate() {
        let row_num = u32::try_from(r + 1).unwrap_or(u32::MAX);
        for (c, cell) in row.iter().enumerate() {
            let col = col_num(c);
            match cell {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row_num, col, s.as_str())?;
                }
                CellValue::Float(v) if v.is_nan() => {}
                CellValue::Float(v) => {
                    worksheet.write_number(row_num, col, *v)?;
                }
                CellValue::Int(v) => {
                    worksheet.write_number(row_num, col, *v as f64)?;
                }
                CellValue::Bool(v) => {
                    worksheet.write_boolean(row_num, col, *v)?;
                }
                CellValue::DateTime(v) if v.is_nan() => {}
                CellValue::DateTime(v) => {
                    let format = if v.fract() == 0.0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    worksheet.write_number_with_format(row_num, col, *v, format)?;
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// Out-of-range indices saturate so the writer reports its own limit error.
fn col_num(idx: usize) -> u16 {
    u16::try_from(idx).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new(["Accession", "AP_1"]);
        ds.push_row(vec![CellValue::text("A1"), CellValue::text("IMG1")]);
        ds.push_row(vec![CellValue::text("A2")]);
        ds
    }

    #[test]
    fn short_rows_are_padded() {
        let ds = sample();
        assert_eq!(ds.cell(1, 1), &CellValue::Empty);
        assert_eq!(ds.cell(9, 9), &CellValue::Empty);
    }

    #[test]
    fn require_columns_reports_sorted_missing_names() {
        let ds = sample();
        assert!(ds.require_columns(&["Accession"]).is_ok());
        match ds.require_columns(&["Lateral_1", "Accession", "AP_2"]) {
            Err(CurationError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["AP_2".to_string(), "Lateral_1".to_string()]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn ensure_column_appends_once() {
        let mut ds = sample();
        let idx = ds.ensure_column("Study_Key");
        assert_eq!(idx, 2);
        assert_eq!(ds.ensure_column("Study_Key"), 2);
        assert_eq!(ds.columns().len(), 3);
        assert_eq!(ds.cell(0, 2), &CellValue::Empty);
    }

    #[test]
    fn workbook_headers_are_trimmed_not_folded() {
        assert_eq!(header_name(&calamine::Data::String(" nan ".to_string())), "nan");
        assert_eq!(header_name(&calamine::Data::String(" Accession".to_string())), "Accession");
        assert_eq!(header_name(&calamine::Data::Empty), "");
    }

    #[test]
    fn iso_date_text_becomes_date_cell() {
        assert_eq!(
            cell_from_data(&calamine::Data::DateTimeIso("2024-03-15".to_string())),
            CellValue::DateTime(45366.0)
        );
        assert_eq!(
            cell_from_data(&calamine::Data::DateTimeIso("2024-03-15T12:00:00".to_string())),
            CellValue::DateTime(45366.5)
        );
        assert_eq!(
            cell_from_data(&calamine::Data::DateTimeIso("PT1H".to_string())),
            CellValue::text("PT1H")
        );
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("a/Labels.XLSX")).ok(),
            Some(SpreadsheetFormat::Xlsx)
        );
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("labels.csv")).ok(),
            Some(SpreadsheetFormat::Csv)
        );
        assert!(!SpreadsheetFormat::ReadOnlyWorkbook.is_writable());
        assert!(matches!(
            SpreadsheetFormat::from_path(Path::new("labels.txt")),
            Err(CurationError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let path = std::env::temp_dir().join("accession-curation-definitely-missing.xlsx");
        assert!(matches!(
            Dataset::load(&path, None),
            Err(CurationError::SpreadsheetNotFound(_))
        ));
    }
}
