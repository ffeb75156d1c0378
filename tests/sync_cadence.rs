//! Periodic sync during large writes must not change what ends up on disk.

use mmap_records::{DelimitedEngine, EngineConfig, FlushPolicy};
use std::fs;
use std::path::Path;

fn engine_with(policy: FlushPolicy) -> DelimitedEngine {
    let config = EngineConfig::builder()
        .delimiter(",")
        .flush_policy(policy)
        .build()
        .expect("config");
    DelimitedEngine::new(config)
}

fn numbered_rows(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| vec![i.to_string(), format!("v{}", i % 7)])
        .collect()
}

fn write_both(dir: &Path, tag: &str, policy: FlushPolicy, table: &[Vec<String>]) -> (Vec<u8>, Vec<u8>) {
    let synced = dir.join(format!("{tag}_synced.txt"));
    let unsynced = dir.join(format!("{tag}_unsynced.txt"));
    engine_with(policy).write_string_table(&synced, table).expect("synced write");
    engine_with(FlushPolicy::Never).write_string_table(&unsynced, table).expect("plain write");
    (fs::read(synced).expect("read synced"), fs::read(unsynced).expect("read unsynced"))
}

#[test]
fn small_interval_around_threshold() {
    let dir = tempfile::tempdir().expect("tempdir");
    for rows in [0, 1, 2, 3, 4, 6, 7, 10] {
        let table = numbered_rows(rows);
        let (synced, plain) = write_both(dir.path(), &format!("small_{rows}"), FlushPolicy::EveryRows(3), &table);
        assert_eq!(synced, plain, "rows = {rows}");

        let engine = engine_with(FlushPolicy::EveryRows(3));
        let read = engine
            .read_as_string_table(dir.path().join(format!("small_{rows}_synced.txt")))
            .expect("read back");
        assert_eq!(read, table);
    }
}

#[test]
fn interval_spanning_pages() {
    // Rows long enough that each sync window crosses page boundaries.
    let dir = tempfile::tempdir().expect("tempdir");
    let table: Vec<Vec<String>> = (0..257)
        .map(|i| vec![format!("{i:05}"), "x".repeat(1000 + i)])
        .collect();
    let (synced, plain) = write_both(dir.path(), "pages", FlushPolicy::EveryRows(5), &table);
    assert_eq!(synced.len(), plain.len());
    assert_eq!(synced, plain);
}

#[test]
fn zero_interval_never_syncs_early() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = numbered_rows(50);
    let (synced, plain) = write_both(dir.path(), "zero", FlushPolicy::EveryRows(0), &table);
    assert_eq!(synced, plain);
}

#[test]
fn default_interval_just_below_and_above() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = DelimitedEngine::with_delimiter(",").expect("engine");
    assert_eq!(engine.config().flush_policy(), FlushPolicy::EveryRows(800_000));

    for rows in [799_999_usize, 800_001] {
        let table: Vec<[&str; 1]> = vec![["7"]; rows];
        let path = dir.path().join(format!("default_{rows}.txt"));
        engine.write_string_table(&path, &table).expect("write");

        let raw = fs::read(&path).expect("raw");
        assert_eq!(raw.len(), rows * 2);
        assert!(raw.chunks(2).all(|pair| pair == b"7\n"));
        assert_eq!(engine.count_lines(&path).expect("count"), rows);
    }
}
