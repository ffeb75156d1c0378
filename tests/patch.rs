//! In-place field patching tests.

use mmap_records::{DelimitedEngine, PatchSet, RecordIoError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const GRID: &[u8] = b"aa bb cc\ndd ee ff\ngg hh ii\n";

fn seeded(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(format!("mmap_records_patch_{name}.txt"));
    fs::write(&path, contents).expect("seed");
    path
}

fn engine() -> DelimitedEngine {
    DelimitedEngine::with_delimiter(" ").expect("engine")
}

fn diff_positions(before: &[u8], after: &[u8]) -> Vec<usize> {
    assert_eq!(before.len(), after.len());
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn same_length_patch_changes_only_target_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "same_length", GRID);

    let mut patches = PatchSet::new();
    patches.insert(1, 2, "XY");
    let written = engine().patch_fields(&path, &patches).expect("patch");
    assert_eq!(written, 1);

    let after = fs::read(&path).expect("read");
    assert_eq!(after, b"aa bb cc\ndd ee XY\ngg hh ii\n");
    // "ff" sits at bytes 15..17.
    assert_eq!(diff_positions(GRID, &after), vec![15, 16]);
}

#[test]
fn checked_patch_matches_unchecked_for_valid_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = seeded(&dir, "valid_unchecked", GRID);
    let b = seeded(&dir, "valid_checked", GRID);

    let patches: PatchSet = vec![(0, 0, "AA"), (1, 1, "EE"), (2, 2, "II"), (2, 0, "GG")]
        .into_iter()
        .collect();
    assert_eq!(engine().patch_fields(&a, &patches).expect("unchecked"), 4);
    assert_eq!(engine().patch_fields_checked(&b, &patches).expect("checked"), 4);

    let after_a = fs::read(&a).expect("read a");
    assert_eq!(after_a, fs::read(&b).expect("read b"));
    assert_eq!(after_a, b"AA bb cc\ndd EE ff\nGG hh II\n");
}

#[test]
fn longer_replacement_corrupts_from_field_onward() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "longer", GRID);

    let mut patches = PatchSet::new();
    patches.insert(1, 1, "XYZ");
    engine().patch_fields(&path, &patches).expect("unchecked patch succeeds");

    // The delimiter after "ee" is overwritten; the row now has two fields.
    let after = fs::read(&path).expect("read");
    assert_eq!(after, b"aa bb cc\ndd XYZff\ngg hh ii\n");
    assert_eq!(after.len(), GRID.len());
    let rows = engine().read_as_string_table(&path).expect("read table");
    assert_eq!(rows[1], vec!["dd", "XYZff"]);
}

#[test]
fn longer_replacement_on_last_field_runs_into_next_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "longer_last", GRID);

    let mut patches = PatchSet::new();
    patches.insert(0, 2, "CCCC");
    engine().patch_fields(&path, &patches).expect("unchecked patch succeeds");

    // The terminator and first byte of row 1 are gone: rows 0 and 1 merge.
    let after = fs::read(&path).expect("read");
    assert_eq!(after, b"aa bb CCCCd ee ff\ngg hh ii\n");
    assert_eq!(engine().read_all_lines(&path).expect("lines").len(), 2);
}

#[test]
fn shorter_replacement_leaves_old_tail() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "shorter", GRID);

    let mut patches = PatchSet::new();
    patches.insert(2, 1, "Q");
    engine().patch_fields(&path, &patches).expect("patch");
    assert_eq!(fs::read(&path).expect("read"), b"aa bb cc\ndd ee ff\ngg Qh ii\n");
}

#[test]
fn replacement_past_end_of_file_is_out_of_bounds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "past_end", b"a b\nc d");

    let mut patches = PatchSet::new();
    patches.insert(1, 1, "long");
    let err = engine().patch_fields(&path, &patches).unwrap_err();
    assert!(matches!(err, RecordIoError::OutOfBounds { offset: 6, len: 4, total: 7 }));
    assert_eq!(fs::read(&path).expect("read"), b"a b\nc d");
}

#[test]
fn checked_patch_rejects_length_mismatch_without_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "checked_mismatch", GRID);

    let mut patches = PatchSet::new();
    patches.insert(0, 0, "ZZ");
    patches.insert(1, 1, "XYZ");
    let err = engine().patch_fields_checked(&path, &patches).unwrap_err();
    assert!(matches!(
        err,
        RecordIoError::LengthMismatch { row: 1, field: 1, expected: 2, actual: 3 }
    ));
    // The valid row-0 patch was not applied either.
    assert_eq!(fs::read(&path).expect("read"), GRID);
}

#[test]
fn checked_patch_rejects_missing_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "checked_missing", GRID);

    let mut patches = PatchSet::new();
    patches.insert(1, 3, "zz");
    let err = engine().patch_fields_checked(&path, &patches).unwrap_err();
    assert!(matches!(err, RecordIoError::FieldNotFound { row: 1, field: 3 }));

    let mut patches = PatchSet::new();
    patches.insert(3, 0, "zz");
    let err = engine().patch_fields_checked(&path, &patches).unwrap_err();
    assert!(matches!(err, RecordIoError::FieldNotFound { row: 3, field: 0 }));
    assert_eq!(fs::read(&path).expect("read"), GRID);
}

#[test]
fn unchecked_patch_skips_missing_targets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "unchecked_missing", GRID);

    let mut patches = PatchSet::new();
    patches.insert(0, 9, "zz");
    patches.insert(2, 0, "GG");
    patches.insert(7, 0, "zz");
    let written = engine().patch_fields(&path, &patches).expect("patch");
    assert_eq!(written, 1);
    assert_eq!(fs::read(&path).expect("read"), b"aa bb cc\ndd ee ff\nGG hh ii\n");
}

#[test]
fn empty_patch_set_leaves_file_identical() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "empty_patch", GRID);
    let before = fs::metadata(&path).expect("meta").modified().expect("mtime");

    assert_eq!(engine().patch_fields(&path, &PatchSet::new()).expect("patch"), 0);
    assert_eq!(engine().patch_fields_checked(&path, &PatchSet::new()).expect("patch"), 0);
    assert_eq!(fs::read(&path).expect("read"), GRID);
    assert_eq!(fs::metadata(&path).expect("meta").modified().expect("mtime"), before);

    // Not even opened: a missing path is fine too.
    let missing = dir.path().join("missing.txt");
    assert_eq!(engine().patch_fields(&missing, &PatchSet::new()).expect("patch"), 0);
}

#[test]
fn row_numbering_skips_blank_lines_like_reads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "blank_numbering", b"\r\nr0 a\r\n\r\n\nr1 b\r\nr2 c\r\n");

    let rows = engine().read_as_string_table(&path).expect("read");
    assert_eq!(rows[1], vec!["r1", "b"]);

    let mut patches = PatchSet::new();
    patches.insert(1, 1, "B");
    engine().patch_fields_checked(&path, &patches).expect("patch");

    let rows = engine().read_as_string_table(&path).expect("read");
    assert_eq!(rows, vec![vec!["r0", "a"], vec!["r1", "B"], vec!["r2", "c"]]);
    assert_eq!(
        fs::read(&path).expect("raw"),
        b"\r\nr0 a\r\n\r\n\nr1 B\r\nr2 c\r\n"
    );
}

#[test]
fn multi_byte_delimiter_offsets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "multi_byte", b"1.000000<>2.000000<>3.000000\n4.000000<>5.000000<>6.000000\n");
    let engine = DelimitedEngine::with_delimiter("<>").expect("engine");

    let mut patches = PatchSet::new();
    patches.insert(1, 2, "9.999999");
    patches.insert(0, 1, "7.500000");
    engine.patch_fields_checked(&path, &patches).expect("patch");

    let table = engine.read_as_number_table(&path).expect("read");
    assert_eq!(table, vec![vec![1.0, 7.5, 3.0], vec![4.0, 5.0, 9.999_999]]);
}

#[test]
fn patch_unterminated_last_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "unterminated", b"a b\nc d");

    let mut patches = PatchSet::new();
    patches.insert(1, 1, "D");
    engine().patch_fields(&path, &patches).expect("patch");
    assert_eq!(fs::read(&path).expect("read"), b"a b\nc D");
}

#[test]
fn patch_on_empty_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "empty_file", b"");

    let mut patches = PatchSet::new();
    patches.insert(0, 0, "x");
    assert_eq!(engine().patch_fields(&path, &patches).expect("unchecked"), 0);
    let err = engine().patch_fields_checked(&path, &patches).unwrap_err();
    assert!(matches!(err, RecordIoError::FieldNotFound { row: 0, field: 0 }));
}

#[test]
fn patch_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut patches = PatchSet::new();
    patches.insert(0, 0, "x");
    let err = engine()
        .patch_fields(dir.path().join("absent.txt"), &patches)
        .unwrap_err();
    assert!(matches!(err, RecordIoError::Io(_)));
}

#[test]
fn carriage_return_only_line_takes_no_row_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = seeded(&dir, "cr_only_line", b"a b\r\n\r\r\nc d\r\n");

    let rows = engine().read_as_string_table(&path).expect("read");
    assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);

    let mut patches = PatchSet::new();
    patches.insert(1, 1, "D");
    assert_eq!(engine().patch_fields(&path, &patches).expect("unchecked"), 1);
    assert_eq!(fs::read(&path).expect("raw"), b"a b\r\n\r\r\nc D\r\n");

    patches.insert(1, 1, "E");
    assert_eq!(engine().patch_fields_checked(&path, &patches).expect("checked"), 1);
    assert_eq!(fs::read(&path).expect("raw"), b"a b\r\n\r\r\nc E\r\n");
}
