//! Curation tools for accession spreadsheets: stable study keys per accession and
//! existence checks for the DICOM files each accession references.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod files;
pub mod keys;
pub mod logging;

pub use config::{FileValidatorConfig, KeyAssignerConfig};
pub use data::{normalize, CellValue, Dataset};
pub use error::{CurationError, Result};
pub use files::{check_files, validate, ImageColumn, MissingFile, ValidationReport, ValidationRow};
pub use keys::{assign_keys, assign_keys_in_place, KeyAssignment, KeyGenerator, UuidKeyGenerator};
