use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{FileValidatorConfig, KeyAssignerConfig, DEFAULT_OUT_CSV};
use crate::files::{check_files, ValidationReport};
use crate::keys::{assign_keys_in_place, UuidKeyGenerator, DEFAULT_KEY_COLUMN};
use crate::logging::init_logging;

#[derive(Debug, Parser)]
#[command(name = "accession-curation")]
#[command(about = "Study key assignment and DICOM file checks for accession spreadsheets")]
pub struct Cli {
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Add or fill a study key column, one UUID per accession.
    AssignKeys(AssignKeysArgs),
    /// Check that the AP/Lateral files listed for each accession exist.
    CheckFiles(CheckFilesArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct AssignKeysArgs {
    /// Spreadsheet to update in place (.xlsx or .csv).
    #[arg(long, value_name = "PATH")]
    pub excel: PathBuf,
    /// Name of the key column to add or update.
    #[arg(long, default_value = DEFAULT_KEY_COLUMN)]
    pub key_column: String,
    /// Worksheet name; the first sheet when omitted.
    #[arg(long)]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct CheckFilesArgs {
    /// Spreadsheet listing accessions and AP/Lateral file names.
    #[arg(long, value_name = "PATH")]
    pub excel: PathBuf,
    /// Directory containing one folder per accession.
    #[arg(long, value_name = "DIR")]
    pub base_dir: PathBuf,
    /// Where to write the list of found .dcm file names.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_OUT_CSV)]
    pub out_csv: PathBuf,
    /// Worksheet name; the first sheet when omitted.
    #[arg(long)]
    pub sheet: Option<String>,
}

/// Standalone form of `assign-keys`.
#[derive(Debug, Parser)]
#[command(name = "assign_study_keys")]
#[command(about = "Add a Study_Key column with UUIDs to the spreadsheet")]
pub struct AssignKeysCli {
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(flatten)]
    pub args: AssignKeysArgs,
}

/// Standalone form of `check-files`.
#[derive(Debug, Parser)]
#[command(name = "check_dicom_files")]
#[command(about = "Validate AP/Lateral DICOM files for each accession listed in a spreadsheet")]
pub struct CheckFilesCli {
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(flatten)]
    pub args: CheckFilesArgs,
}

impl From<&AssignKeysArgs> for KeyAssignerConfig {
    fn from(args: &AssignKeysArgs) -> Self {
        Self {
            spreadsheet: args.excel.clone(),
            key_column: args.key_column.clone(),
            sheet: args.sheet.clone(),
        }
    }
}

impl From<&CheckFilesArgs> for FileValidatorConfig {
    fn from(args: &CheckFilesArgs) -> Self {
        Self {
            spreadsheet: args.excel.clone(),
            base_dir: args.base_dir.clone(),
            out_csv: args.out_csv.clone(),
            sheet: args.sheet.clone(),
        }
    }
}

fn parse_or_exit_code<P, I, T>(args: I) -> Result<P, i32>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    P::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        err.exit_code()
    })
}

pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli: Cli = match parse_or_exit_code(args) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    init_logging(cli.verbose);
    match &cli.command {
        Command::AssignKeys(args) => handle_assign_keys(args),
        Command::CheckFiles(args) => handle_check_files(args),
    }
}

pub fn run_assign_keys_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli: AssignKeysCli = match parse_or_exit_code(args) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    init_logging(cli.verbose);
    handle_assign_keys(&cli.args)
}

pub fn run_check_files_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli: CheckFilesCli = match parse_or_exit_code(args) {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    init_logging(cli.verbose);
    handle_check_files(&cli.args)
}

fn handle_assign_keys(args: &AssignKeysArgs) -> i32 {
    let config = KeyAssignerConfig::from(args);
    match assign_keys_in_place(&config, &mut UuidKeyGenerator) {
        Ok(_) => {
            println!(
                "Updated {} with column {}.",
                config.spreadsheet.display(),
                config.key_column
            );
            0
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn handle_check_files(args: &CheckFilesArgs) -> i32 {
    let config = FileValidatorConfig::from(args);
    match check_files(&config) {
        Ok(report) => {
            for line in report_lines(&report, &config.out_csv) {
                println!("{line}");
            }
            if report.has_missing() {
                1
            } else {
                0
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

/// Console output for a finished validation run, in print order.
pub fn report_lines(report: &ValidationReport, out_csv: &Path) -> Vec<String> {
    let mut lines: Vec<String> = report
        .missing
        .iter()
        .map(|missing| format!("ERROR: {missing}"))
        .collect();
    if !report.rows.is_empty() {
        lines.push(format!(
            "Wrote {} rows ({} found filenames) to {}.",
            report.rows.len(),
            report.found_count(),
            out_csv.display()
        ));
    }
    lines.push(format!("Checked {} AP/Lateral entries.", report.checked_count));
    if report.has_missing() {
        lines.push(format!("Found {} missing file(s).", report.missing_count()));
    } else {
        lines.push("All files found.".to_string());
    }
    lines
}
