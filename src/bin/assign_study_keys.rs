//! Add or fill a Study_Key column in an accession spreadsheet, one UUID per accession.
//! Run: cargo run --bin assign_study_keys -- --excel labels.xlsx [--key-column Study_Key]

use std::env;
use std::process;

fn main() {
    process::exit(accession_curation::cli::run_assign_keys_with_args(env::args_os()));
}
