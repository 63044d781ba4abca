//! Reading and writing XPT files on disk.

use std::path::Path;

use xport::{
    XptColumn, XptDataset, XptError, XptReader, XptReaderOptions, XptValue, XptWriter,
    XptWriterOptions, read_xpt, read_xpt_library, read_xpt_with_options, write_xpt,
    write_xpt_library,
};

fn demographics() -> XptDataset {
    let mut dataset = XptDataset::with_columns(
        "DM",
        vec![
            XptColumn::character("USUBJID", 20).with_label("Unique Subject ID"),
            XptColumn::numeric("AGE").with_label("Age"),
            XptColumn::character("SEX", 1),
        ],
    )
    .with_label("Demographics");
    dataset
        .add_row(vec![
            XptValue::character("STUDY-001"),
            XptValue::numeric(35.0),
            XptValue::character("M"),
        ])
        .unwrap();
    dataset
        .add_row(vec![
            XptValue::character("STUDY-002"),
            XptValue::numeric(42.0),
            XptValue::character("F"),
        ])
        .unwrap();
    dataset
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dm.xpt");
    let dataset = demographics();

    write_xpt(&path, &dataset).unwrap();
    let size = std::fs::metadata(&path).unwrap().len();
    assert_eq!(size % 80, 0);

    let read_back = read_xpt(&path).unwrap();
    assert_eq!(read_back.name, "DM");
    assert_eq!(read_back.label.as_deref(), Some("Demographics"));
    assert_eq!(read_back.columns, dataset.columns);
    assert_eq!(read_back.rows, dataset.rows);
}

#[test]
fn test_library_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("study.xpt");
    let dm = demographics();
    let mut ae = XptDataset::with_columns("AE", vec![XptColumn::character("AETERM", 40)]);
    ae.add_row(vec![XptValue::character("Headache")]).unwrap();

    let options = XptWriterOptions::default().with_os_name("X64_10PR");
    write_xpt_library(&path, &[dm.clone(), ae.clone()], &options).unwrap();

    let library = read_xpt_library(&path).unwrap();
    assert_eq!(library.header.os_name, "X64_10PR");
    assert_eq!(library.datasets.len(), 2);
    assert_eq!(library.datasets[0].rows, dm.rows);
    assert_eq!(library.datasets[1].rows, ae.rows);
}

#[test]
fn test_create_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dm.xpt");

    XptWriter::create(&path)
        .unwrap()
        .write_dataset(&demographics())
        .unwrap();

    let mut reader = XptReader::open(&path).unwrap();
    assert_eq!(reader.dataset_name(), "DM");
    assert_eq!(reader.rows().count(), 2);
}

#[test]
fn test_read_with_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dm.xpt");
    write_xpt(&path, &demographics()).unwrap();

    let dataset = read_xpt_with_options(&path, XptReaderOptions::new().keep_padding()).unwrap();
    assert_eq!(dataset.rows[0][0], XptValue::character(format!("{:<20}", "STUDY-001")));
}

#[test]
fn test_missing_file() {
    let err = read_xpt(Path::new("/nonexistent/path/dm.xpt")).unwrap_err();
    assert!(matches!(err, XptError::FileNotFound { .. }));
}

#[test]
fn test_failed_write_leaves_no_partial_member() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xpt");
    let mut dataset = demographics();
    dataset.rows[1][1] = XptValue::numeric(1e100);

    let err = write_xpt(&path, &dataset).unwrap_err();
    assert!(matches!(err, XptError::FloatOverflow { .. }));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}
