//! Integration Tests for the Memoized Facade
//!
//! Exercises call, persist, empty and sync end to end against a real ledger
//! file in a temporary directory.

use std::cell::Cell;
use std::collections::BTreeSet;

use memo_cache::{
    CacheConfig, CacheError, CacheKey, Compression, DiskLedger, Memoized, SyncDirection,
};
use tempfile::TempDir;

// == Helper Functions ==

fn config(dir: &TempDir, file: &str) -> CacheConfig {
    CacheConfig::default().with_path(dir.path().join(file))
}

/// Keys the facade computes for each argument.
fn keys_for<F>(memo: &Memoized<i64, i64, F>, args: &[i64]) -> BTreeSet<CacheKey>
where
    F: FnMut(&i64) -> i64,
{
    args.iter().map(|a| memo.key_of(a).unwrap()).collect()
}

fn memory_keys<F>(memo: &Memoized<i64, i64, F>) -> BTreeSet<CacheKey>
where
    F: FnMut(&i64) -> i64,
{
    memo.memory().keys().copied().collect()
}

// == Eviction ==

#[test]
fn test_fifo_eviction_by_entry_count() {
    let dir = tempfile::tempdir().unwrap();
    let mut ident = Memoized::named(
        "ident",
        |x: &i64| *x,
        config(&dir, "ident.bin").with_max_entries(3),
    )
    .unwrap();

    for i in 1..=4 {
        ident.call(&i).unwrap();
    }

    assert_eq!(ident.len(), 3);
    assert_eq!(memory_keys(&ident), keys_for(&ident, &[2, 3, 4]));
    assert_eq!(ident.stats().evictions, 1);
}

#[test]
fn test_fifo_eviction_by_bytes() {
    let dir = tempfile::tempdir().unwrap();
    // 1 KiB holds 128 i64 results
    let mut ident = Memoized::named(
        "ident",
        |x: &i64| *x,
        config(&dir, "ident.bin").with_max_bytes(1024),
    )
    .unwrap();

    for i in 1..=128 {
        ident.call(&i).unwrap();
    }
    assert_eq!(ident.memory().size(), 1024);
    assert_eq!(ident.stats().evictions, 0);

    ident.call(&129).unwrap();
    let expected: Vec<i64> = (2..=129).collect();
    assert_eq!(memory_keys(&ident), keys_for(&ident, &expected));
    assert!(ident.memory().size() <= 1024);
}

#[test]
fn test_recompute_after_eviction_without_disk_copy() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let mut double = Memoized::named(
        "double",
        |x: &i64| {
            runs.set(runs.get() + 1);
            x * 2
        },
        config(&dir, "double.bin").with_max_entries(1),
    )
    .unwrap();

    let first = double.call(&21).unwrap();
    double.call(&5).unwrap(); // evicts 21
    let second = double.call(&21).unwrap();

    assert_eq!(first, 42);
    assert_eq!(first, second);
    assert_eq!(runs.get(), 3);
    assert_eq!(double.stats().misses, 3);
}

// == Persistence ==

#[test]
fn test_save_empty_load_reproduces_memory() {
    let dir = tempfile::tempdir().unwrap();
    let mut cube = Memoized::named("cube", |x: &i64| x * x * x, config(&dir, "cube.bin")).unwrap();

    for i in -5..=5 {
        cube.call(&i).unwrap();
    }
    let before: Vec<(CacheKey, i64)> = cube.memory().iter().map(|(k, v)| (*k, *v)).collect();

    cube.persist().unwrap();
    cube.empty(false).unwrap();
    assert!(cube.is_empty());

    let report = cube.sync(SyncDirection::Disk).unwrap();
    assert_eq!(report.loaded, 11);

    let after: Vec<(CacheKey, i64)> = cube.memory().iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(before, after);
}

#[test]
fn test_compressed_ledger_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut words = Memoized::named(
        "words",
        |n: &u32| "word ".repeat(*n as usize),
        config(&dir, "words.bin.gz"),
    )
    .unwrap();
    assert_eq!(words.ledger().compression(), Compression::Gzip);

    let expected = words.call(&50).unwrap();
    words.persist().unwrap();
    words.empty(false).unwrap();

    assert_eq!(words.call(&50).unwrap(), expected);
    assert_eq!(words.stats().disk_hits, 1);
}

#[test]
fn test_memory_miss_falls_back_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let mut inc = Memoized::named(
        "inc",
        |x: &i64| {
            runs.set(runs.get() + 1);
            x + 1
        },
        config(&dir, "inc.bin"),
    )
    .unwrap();

    for i in 1..=3 {
        inc.call(&i).unwrap();
    }
    inc.persist().unwrap();
    inc.empty(false).unwrap();
    for i in 4..=6 {
        inc.call(&i).unwrap();
    }

    assert_eq!(inc.call(&1).unwrap(), 2); // only on disk
    assert_eq!(inc.call(&4).unwrap(), 5); // in memory
    assert_eq!(runs.get(), 6);

    let stats = inc.stats();
    assert_eq!(stats.disk_hits, 1);
    assert_eq!(stats.hits, 1);
}

#[test]
fn test_reopened_cache_reads_previous_ledger() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut inc = Memoized::named("inc", |x: &i64| x + 1, config(&dir, "inc.bin")).unwrap();
        inc.call(&10).unwrap();
        inc.persist().unwrap();
    }

    let runs = Cell::new(0);
    let mut inc = Memoized::named(
        "inc",
        |x: &i64| {
            runs.set(runs.get() + 1);
            x + 1
        },
        config(&dir, "inc.bin"),
    )
    .unwrap();

    assert_eq!(inc.ledger().len(), 1);
    assert_eq!(inc.call(&10).unwrap(), 11);
    assert_eq!(runs.get(), 0);
}

#[test]
fn test_persist_twice_appends_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut inc = Memoized::named("inc", |x: &i64| x + 1, config(&dir, "inc.bin")).unwrap();

    inc.call(&1).unwrap();
    inc.call(&2).unwrap();
    assert_eq!(inc.persist().unwrap(), 2);
    let len = std::fs::metadata(inc.path()).unwrap().len();

    assert_eq!(inc.persist().unwrap(), 0);
    assert_eq!(std::fs::metadata(inc.path()).unwrap().len(), len);
}

// == Synchronization ==

#[test]
fn test_bidirectional_sync_keeps_most_recent() {
    let dir = tempfile::tempdir().unwrap();
    let mut neg = Memoized::named(
        "neg",
        |x: &i64| -x,
        config(&dir, "neg.bin").with_max_entries(4),
    )
    .unwrap();

    // three keys only on disk
    for i in 1..=3 {
        neg.call(&i).unwrap();
    }
    neg.sync(SyncDirection::Memory).unwrap();
    neg.empty(false).unwrap();

    // three different keys only in memory
    for i in 11..=13 {
        neg.call(&i).unwrap();
    }

    let report = neg.sync(SyncDirection::Both).unwrap();
    assert_eq!(report.saved, 3);
    assert_eq!(report.loaded, 1);
    assert_eq!(memory_keys(&neg), keys_for(&neg, &[3, 11, 12, 13]));
    assert_eq!(neg.ledger().len(), 6);
}

#[test]
fn test_sync_restores_newest_disk_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut ident = Memoized::named(
        "ident",
        |x: &i64| *x,
        config(&dir, "ident.bin").with_max_entries(3),
    )
    .unwrap();

    for i in 1..=4 {
        ident.call(&i).unwrap();
    }
    ident.persist().unwrap(); // 2, 3, 4 on disk
    ident.empty(false).unwrap();
    ident.call(&5).unwrap();
    ident.call(&6).unwrap();

    ident.sync(SyncDirection::Both).unwrap();
    assert_eq!(memory_keys(&ident), keys_for(&ident, &[4, 5, 6]));
    assert_eq!(ident.ledger().len(), 5);
}

#[test]
fn test_load_without_ledger_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut inc = Memoized::named("inc", |x: &i64| x + 1, config(&dir, "inc.bin")).unwrap();
    inc.call(&1).unwrap();

    let report = inc.sync(SyncDirection::Disk).unwrap();
    assert_eq!(report.loaded, 0);
    assert_eq!(inc.len(), 1);
    assert!(!inc.path().exists());
}

#[test]
fn test_sync_direction_from_str() {
    let direction: SyncDirection = "both".parse().unwrap();
    assert_eq!(direction, SyncDirection::Both);
    assert!(matches!(
        "up".parse::<SyncDirection>(),
        Err(CacheError::UnknownSyncDirection(_))
    ));
}

// == Ledger ==

#[test]
fn test_erase_nonexistent_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger: DiskLedger<CacheKey> =
        DiskLedger::open(dir.path().join("never.bin"), Compression::None).unwrap();

    assert!(ledger.erase().is_ok());
    assert!(!ledger.exists());
}

#[test]
fn test_empty_also_disk_removes_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let mut inc = Memoized::named("inc", |x: &i64| x + 1, config(&dir, "inc.bin")).unwrap();

    inc.call(&1).unwrap();
    inc.persist().unwrap();
    inc.empty(true).unwrap();

    assert!(!inc.path().exists());
    assert!(!inc.ledger().index_path().exists());
    // second erase of a missing file is still fine
    inc.empty(true).unwrap();
}

// == Identity ==

#[test]
fn test_closures_need_a_name_on_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig::default().with_cache_dir(dir.path());

    let inc = Memoized::new(|x: &i64| x + 1, config.clone());
    let times = Memoized::new(|x: &i64| x * 100, config);

    assert!(matches!(inc, Err(CacheError::UnnamedComputation { .. })));
    assert!(matches!(times, Err(CacheError::UnnamedComputation { .. })));
}

#[test]
fn test_named_closures_share_a_config_without_mixing_results() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, "shared.bin");

    let mut inc = Memoized::named("inc", |x: &i64| x + 1, config.clone()).unwrap();
    inc.call(&1).unwrap();
    inc.persist().unwrap();
    drop(inc);

    let mut times = Memoized::named("times100", |x: &i64| x * 100, config.clone()).unwrap();
    assert_eq!(times.call(&1).unwrap(), 100);
    assert_eq!(times.stats().disk_hits, 0);
    times.persist().unwrap();
    drop(times);

    // both results live in the one ledger under distinct keys
    let mut inc = Memoized::named("inc", |_: &i64| -> i64 { unreachable!() }, config).unwrap();
    assert_eq!(inc.ledger().len(), 2);
    assert_eq!(inc.call(&1).unwrap(), 2);
}
