pub mod cell;
pub mod dataset;

pub use cell::{normalize, normalize_str, CellValue};
pub use dataset::{Dataset, SpreadsheetFormat};
