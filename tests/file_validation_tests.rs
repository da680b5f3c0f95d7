use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use accession_curation::{
    check_files, validate, CellValue, CurationError, Dataset, FileValidatorConfig, ImageColumn,
};

const IMAGE_COLUMNS: [&str; 6] = ["AP_1", "AP_2", "AP_3", "Lateral_1", "Lateral_2", "Lateral_3"];

fn unique_temp_dir(name: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "accession-curation-{name}-{}-{stamp}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    dir
}

fn touch(base: &Path, accession: &str, file: &str) {
    let dir = base.join(accession);
    fs::create_dir_all(&dir).expect("accession dir should be created");
    fs::write(dir.join(file), b"DICM").expect("image fixture should be written");
}

fn dataset_with(rows: &[[&str; 7]]) -> Dataset {
    let mut ds = Dataset::new(std::iter::once("Accession").chain(IMAGE_COLUMNS));
    for row in rows {
        ds.push_row(row.iter().map(|v| CellValue::from_raw(v)).collect());
    }
    ds
}

#[test]
fn value_without_extension_matches_dcm_file() {
    let base = unique_temp_dir("files-ext");
    touch(&base, "ACC1", "IMG1.dcm");
    let ds = dataset_with(&[["ACC1", "IMG1", "", "", "", "", ""]]);

    let report = validate(&ds, &base).expect("validate");
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].get(ImageColumn::Ap1), "IMG1.dcm");
    assert_eq!(report.checked_count, 1);
    assert_eq!(report.missing_count(), 0);

    let _ = fs::remove_dir_all(base);
}

#[test]
fn value_with_extension_matches_as_written() {
    let base = unique_temp_dir("files-with-ext");
    touch(&base, "ACC1", "IMG1.dcm");
    let ds = dataset_with(&[["ACC1", "IMG1.dcm", "", "", "", "", ""]]);

    let report = validate(&ds, &base).expect("validate");
    assert_eq!(report.rows[0].ap_1, "IMG1.dcm");
    assert!(!report.has_missing());

    let _ = fs::remove_dir_all(base);
}

#[test]
fn extensionless_file_on_disk_is_found_under_dcm_display_name() {
    let base = unique_temp_dir("files-bare");
    touch(&base, "ACC1", "IMG7");
    let ds = dataset_with(&[["ACC1", "", "", "", "IMG7", "", ""]]);

    let report = validate(&ds, &base).expect("validate");
    assert_eq!(report.rows[0].lateral_1, "IMG7.dcm");
    assert!(!report.has_missing());

    let _ = fs::remove_dir_all(base);
}

#[test]
fn missing_file_leaves_column_empty_and_records_one_diagnostic() {
    let base = unique_temp_dir("files-missing");
    fs::create_dir_all(base.join("ACC1")).expect("accession dir");
    let ds = dataset_with(&[["ACC1", "IMG1", "", "", "", "", ""]]);

    let report = validate(&ds, &base).expect("validate");
    assert_eq!(report.rows[0].ap_1, "");
    assert_eq!(report.missing.len(), 1);
    assert_eq!(
        report.missing[0].to_string(),
        "Missing file for Accession ACC1 (AP_1): IMG1.dcm"
    );

    let _ = fs::remove_dir_all(base);
}

#[test]
fn counts_checked_and_missing_entries() {
    let base = unique_temp_dir("files-counts");
    for (acc, files) in [
        ("A1", ["a1.dcm", "l1.dcm"]),
        ("A2", ["a2.dcm", "l2.dcm"]),
        ("A3", ["a3.dcm", "unused.dcm"]),
    ] {
        for file in files {
            touch(&base, acc, file);
        }
    }
    let ds = dataset_with(&[
        ["A1", "a1", "", "", "l1", "", ""],
        ["A2", "", "a2.dcm", "", "", "l2", ""],
        ["A3", "", "", "a3", "", "", "l3"],
        ["nan", "x", "", "", "", "", ""],
    ]);

    let report = validate(&ds, &base).expect("validate");
    assert_eq!(report.checked_count, 6);
    assert_eq!(report.missing_count(), 1);
    assert_eq!(report.missing[0].column, ImageColumn::Lateral3);
    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.found_count(), 5);

    let _ = fs::remove_dir_all(base);
}

#[test]
fn missing_required_columns_fail_before_row_processing() {
    let base = unique_temp_dir("files-columns");
    let mut ds = Dataset::new(["AP_1", "Lateral_1"]);
    ds.push_row(vec![CellValue::text("IMG1"), CellValue::text("IMG2")]);

    match validate(&ds, &base) {
        Err(CurationError::MissingColumns(missing)) => assert_eq!(
            missing,
            vec!["AP_2", "AP_3", "Accession", "Lateral_2", "Lateral_3"]
        ),
        other => panic!("expected missing columns, got {other:?}"),
    }

    let _ = fs::remove_dir_all(base);
}

#[test]
fn absent_base_directory_is_fatal() {
    let base = unique_temp_dir("files-nodir");
    let sheet = base.join("labels.csv");
    fs::write(&sheet, "Accession,AP_1,AP_2,AP_3,Lateral_1,Lateral_2,Lateral_3\n")
        .expect("fixture should be written");

    let config = FileValidatorConfig::new(&sheet, base.join("no-such-dir"));
    assert!(matches!(
        check_files(&config),
        Err(CurationError::DirectoryNotFound(_))
    ));

    let _ = fs::remove_dir_all(base);
}

#[test]
fn output_csv_uses_fixed_column_order() {
    let base = unique_temp_dir("files-order");
    touch(&base, "ACC1", "L1.dcm");
    touch(&base, "ACC1", "A1.dcm");
    let sheet = base.join("labels.csv");
    fs::write(
        &sheet,
        "Lateral_3,MRN,Lateral_1,AP_3,Accession,AP_2,Lateral_2,AP_1\n\
         ,m1,L1,,ACC1,,,A1\n\
         ,m2,,,,,,A9\n",
    )
    .expect("fixture should be written");
    let out = base.join("found.csv");

    let report = check_files(&FileValidatorConfig::new(&sheet, &base).with_out_csv(&out))
        .expect("check files");
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.checked_count, 2);

    let written = fs::read_to_string(&out).expect("output written");
    assert_eq!(
        written,
        "Accession,AP_1,AP_2,AP_3,Lateral_1,Lateral_2,Lateral_3\nACC1,A1.dcm,,,L1.dcm,,\n"
    );

    let _ = fs::remove_dir_all(base);
}

#[test]
fn no_output_file_without_accession_rows() {
    let base = unique_temp_dir("files-empty");
    let sheet = base.join("labels.csv");
    fs::write(
        &sheet,
        "Accession,AP_1,AP_2,AP_3,Lateral_1,Lateral_2,Lateral_3\n,IMG1,,,,,\n",
    )
    .expect("fixture should be written");
    let out = base.join("found.csv");

    let report = check_files(&FileValidatorConfig::new(&sheet, &base).with_out_csv(&out))
        .expect("check files");
    assert!(report.rows.is_empty());
    assert_eq!(report.checked_count, 0);
    assert!(!out.exists());

    let _ = fs::remove_dir_all(base);
}
