//! Cell values as seen by the curation passes.
//!
//! Loaders map absent or unreadable cells to [`CellValue::Empty`] and keep everything else
//! as stored, so a rewrite reproduces the sheet. [`normalize`] then folds the remaining
//! spreadsheet quirks (NaN floats, literal "nan" text, padding) into one trimmed string,
//! empty when the cell carries nothing.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Integral floats below this magnitude print without a fractional part.
const INTEGRAL_FLOAT_LIMIT: f64 = 1e15;

/// Serial number of 9999-12-31, the last date a workbook can hold.
const MAX_DATE_SERIAL: f64 = 2_958_465.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Float(f64),
    Int(i64),
    Bool(bool),
    /// Workbook date or date-time as a day serial number (1900 date system).
    DateTime(f64),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Zero-length strings become `Empty`. Whitespace is kept so a rewrite leaves the
    /// cell as it was; [`normalize`] still reads it as blank.
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        normalize(self).is_empty()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Float(v) => write!(f, "{}", format_float(*v)),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(dt) => f.write_str(&format_datetime(dt)),
                None => write!(f, "{}", format_float(*serial)),
            },
        }
    }
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_finite() && value.fract() == 0.0 && value.abs() < INTEGRAL_FLOAT_LIMIT {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Serials from 61 on match the calendar; earlier ones are off by the fictitious
/// 1900-02-29 and only matter for times of day.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_DATE_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    excel_epoch()?.checked_add_signed(Duration::milliseconds(millis))
}

pub fn datetime_to_serial(dt: NaiveDateTime) -> Option<f64> {
    let millis = dt.signed_duration_since(excel_epoch()?).num_milliseconds();
    Some(millis as f64 / MILLIS_PER_DAY)
}

/// `YYYY-MM-DD` at midnight, `YYYY-MM-DD HH:MM:SS` otherwise.
fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Trimmed string form of a cell; empty for absent cells, NaN and the text "nan".
pub fn normalize(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Float(v) if v.is_nan() => String::new(),
        CellValue::Text(s) => normalize_str(s),
        other => normalize_str(&other.to_string()),
    }
}

pub fn normalize_str(raw: &str) -> String {
    let text = raw.trim();
    if text.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        text.to_string()
    }
}
