//! Surrogate study keys: one stable identifier per accession.
//!
//! Keys already present in the sheet are harvested first and reused; only accessions that
//! have no key anywhere in the sheet get a fresh one. Running the pass again over its own
//! output changes nothing.

use std::collections::HashMap;

use uuid::Uuid;

use crate::config::KeyAssignerConfig;
use crate::data::{normalize, CellValue, Dataset, SpreadsheetFormat};
use crate::error::{CurationError, Result};

pub const ACCESSION_COLUMN: &str = "Accession";
pub const DEFAULT_KEY_COLUMN: &str = "Study_Key";

/// Source of new surrogate keys.
pub trait KeyGenerator {
    fn next_key(&mut self) -> String;
}

/// Random (v4) UUIDs in lowercase hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn next_key(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Normalized accession -> surrogate key, first key seen wins.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    keys: HashMap<String, String>,
}

impl KeyMap {
    pub fn get(&self, accession: &str) -> Option<&str> {
        self.keys.get(accession).map(String::as_str)
    }

    /// Records `key` unless the accession already has one. Returns whether it was stored.
    pub fn harvest(&mut self, accession: &str, key: String) -> bool {
        if self.keys.contains_key(accession) {
            return false;
        }
        self.keys.insert(accession.to_string(), key);
        true
    }

    pub fn get_or_generate(
        &mut self,
        accession: &str,
        generator: &mut impl KeyGenerator,
    ) -> (&str, bool) {
        let mut generated = false;
        let key = self.keys.entry(accession.to_string()).or_insert_with(|| {
            generated = true;
            generator.next_key()
        });
        (key.as_str(), generated)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyAssignment {
    /// Accessions whose key was reused from the sheet.
    pub harvested: usize,
    /// Accessions that received a new key.
    pub generated: usize,
    /// Rows whose key column was written.
    pub rows_keyed: usize,
    /// Rows whose key value differs from what the sheet held before.
    pub rows_changed: usize,
    /// Rows left alone because the accession is blank.
    pub rows_skipped: usize,
}

/// Fills `key_column` for every row with a non-blank accession, creating the column if
/// needed. Fails before touching any row when the accession column is missing.
pub fn assign_keys(
    dataset: &mut Dataset,
    key_column: &str,
    generator: &mut impl KeyGenerator,
) -> Result<KeyAssignment> {
    dataset.require_columns(&[ACCESSION_COLUMN])?;
    let accession_idx = dataset
        .column_index(ACCESSION_COLUMN)
        .unwrap_or_default();
    let key_idx = dataset.ensure_column(key_column);

    let accessions: Vec<String> = (0..dataset.len())
        .map(|row| normalize(dataset.cell(row, accession_idx)))
        .collect();

    let mut summary = KeyAssignment::default();
    let mut key_map = KeyMap::default();

    for (row, accession) in accessions.iter().enumerate() {
        if accession.is_empty() {
            continue;
        }
        let existing = normalize(dataset.cell(row, key_idx));
        if existing.is_empty() {
            continue;
        }
        match key_map.get(accession) {
            None => {
                key_map.harvest(accession, existing);
                summary.harvested += 1;
            }
            Some(kept) if kept != existing => {
                tracing::warn!(
                    row,
                    accession = %accession,
                    kept,
                    discarded = %existing,
                    "conflicting keys for accession, keeping the first"
                );
            }
            Some(_) => {}
        }
    }

    for (row, accession) in accessions.iter().enumerate() {
        if accession.is_empty() {
            summary.rows_skipped += 1;
            continue;
        }
        let before = normalize(dataset.cell(row, key_idx));
        let (key, generated) = key_map.get_or_generate(accession, generator);
        if generated {
            tracing::debug!(row, accession = %accession, key, "generated key");
            summary.generated += 1;
        }
        if before != key {
            summary.rows_changed += 1;
        }
        let key = key.to_string();
        dataset.set_cell(row, key_idx, CellValue::Text(key));
        summary.rows_keyed += 1;
    }

    tracing::info!(
        key_column,
        harvested = summary.harvested,
        generated = summary.generated,
        rows_keyed = summary.rows_keyed,
        rows_changed = summary.rows_changed,
        rows_skipped = summary.rows_skipped,
        "assigned study keys"
    );
    Ok(summary)
}

/// Loads the configured spreadsheet, assigns keys, and overwrites the file in place.
/// Nothing is written when loading or key assignment fails.
pub fn assign_keys_in_place(
    config: &KeyAssignerConfig,
    generator: &mut impl KeyGenerator,
) -> Result<KeyAssignment> {
    let path = config.spreadsheet.as_path();
    if !path.exists() {
        return Err(CurationError::SpreadsheetNotFound(path.to_path_buf()));
    }
    if !SpreadsheetFormat::from_path(path)?.is_writable() {
        return Err(CurationError::UnsupportedFormat(path.to_path_buf()));
    }

    let mut dataset = Dataset::load(path, config.sheet.as_deref())?;
    let summary = assign_keys(&mut dataset, &config.key_column, generator)?;
    dataset.save(path)?;
    Ok(summary)
}
