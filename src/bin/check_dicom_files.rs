//! Check that every AP/Lateral DICOM file listed per accession exists under a base directory.
//! Run: cargo run --bin check_dicom_files -- --excel labels.xlsx --base-dir scans [--out-csv found_files.csv]

use std::env;
use std::process;

fn main() {
    process::exit(accession_curation::cli::run_check_files_with_args(env::args_os()));
}
