use std::env;
use std::process;

use accession_curation::cli;

fn main() {
    process::exit(cli::run_with_args(env::args_os()));
}
