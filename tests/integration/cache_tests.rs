use chrono::{Duration, Utc};
use dupsweep::cache::{CacheRecord, PersistentCache};
use dupsweep::duplicates::DuplicateFinder;
use dupsweep::scanner::DirectorySet;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn scanned(paths: &[&Path]) -> (DirectorySet, dupsweep::duplicates::DuplicateIndex) {
    let dirs = DirectorySet::new(paths).unwrap();
    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(&dirs)
        .unwrap();
    (dirs, outcome.index)
}

fn populated() -> (TempDir, TempDir) {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    fs::write(a.path().join("x.txt"), b"same").unwrap();
    fs::write(b.path().join("y.txt"), b"same").unwrap();
    fs::write(a.path().join("empty"), b"").unwrap();
    (a, b)
}

#[test]
fn test_round_trip_returns_equal_index() {
    let (a, b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path().join("cache"));

    let (dirs, index) = scanned(&[a.path(), b.path()]);
    assert!(index.has_duplicates());
    cache.store(&dirs, &index).unwrap();

    assert_eq!(cache.retrieve(&dirs, 60), Some(index));
}

#[test]
fn test_retrieve_with_reordered_input_hits() {
    let (a, b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (dirs, index) = scanned(&[a.path(), b.path()]);
    cache.store(&dirs, &index).unwrap();

    let reordered = DirectorySet::new([b.path(), a.path()]).unwrap();
    assert_eq!(cache.retrieve(&reordered, 60), Some(index));
}

#[test]
fn test_subset_is_a_miss() {
    let (a, b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (dirs, index) = scanned(&[a.path(), b.path()]);
    cache.store(&dirs, &index).unwrap();

    let only_a = DirectorySet::new([a.path()]).unwrap();
    assert!(cache.retrieve(&only_a, 60).is_none());
}

#[test]
fn test_zero_threshold_after_delay_is_a_miss() {
    let (a, _b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (dirs, index) = scanned(&[a.path()]);
    cache.store(&dirs, &index).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(20));

    assert!(cache.retrieve(&dirs, 0).is_none());
    assert!(cache.retrieve(&dirs, 1).is_some());
}

#[test]
fn test_old_record_is_a_miss() {
    let (a, _b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (dirs, index) = scanned(&[a.path()]);
    let record = CacheRecord::with_created_at(index, Utc::now() - Duration::minutes(90));
    cache.write_record(&record).unwrap();

    assert!(cache.retrieve(&dirs, 60).is_none());
    assert!(cache.retrieve(&dirs, 120).is_some());
}

#[test]
fn test_corrupt_records_are_misses() {
    let (a, _b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (dirs, index) = scanned(&[a.path()]);
    let path = cache.store(&dirs, &index).unwrap();
    let good = fs::read_to_string(&path).unwrap();

    fs::write(&path, "not json at all").unwrap();
    assert!(cache.retrieve(&dirs, 60).is_none());

    fs::write(&path, &good[..good.len() / 2]).unwrap();
    assert!(cache.retrieve(&dirs, 60).is_none());

    fs::write(&path, good.replace("x.txt", "z.txt")).unwrap();
    assert!(cache.retrieve(&dirs, 60).is_none());

    fs::write(&path, &good).unwrap();
    assert!(cache.retrieve(&dirs, 60).is_some());
}

#[test]
fn test_clear_makes_every_retrieve_miss() {
    let (a, b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (both, both_index) = scanned(&[a.path(), b.path()]);
    let (only_a, a_index) = scanned(&[a.path()]);
    cache.store(&both, &both_index).unwrap();
    cache.store(&only_a, &a_index).unwrap();
    fs::write(cache_dir.path().join("notes.txt"), b"keep me").unwrap();

    let preview = cache.clear_with(true);
    assert_eq!(preview.removed.len(), 2);
    assert!(cache.retrieve(&both, 60).is_some());

    let report = cache.clear();
    assert!(report.is_success());
    assert_eq!(report.removed.len(), 2);
    assert!(cache.retrieve(&both, u64::MAX).is_none());
    assert!(cache.retrieve(&only_a, u64::MAX).is_none());
    assert!(cache_dir.path().join("notes.txt").exists());
}

#[test]
fn test_invalidate_only_touches_one_set() {
    let (a, b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (both, both_index) = scanned(&[a.path(), b.path()]);
    let (only_a, a_index) = scanned(&[a.path()]);
    cache.store(&both, &both_index).unwrap();
    cache.store(&only_a, &a_index).unwrap();

    assert!(cache.invalidate(&both).unwrap());
    assert!(!cache.invalidate(&both).unwrap());
    assert!(cache.retrieve(&both, 60).is_none());
    assert!(cache.retrieve(&only_a, 60).is_some());
}

#[test]
fn test_store_replaces_previous_record() {
    let (a, _b) = populated();
    let cache_dir = tempdir().unwrap();
    let cache = PersistentCache::new(cache_dir.path());

    let (dirs, first) = scanned(&[a.path()]);
    cache.store(&dirs, &first).unwrap();

    fs::write(a.path().join("x2.txt"), b"same").unwrap();
    let (_, second) = scanned(&[a.path()]);
    assert_ne!(first, second);
    cache.store(&dirs, &second).unwrap();

    assert_eq!(cache.retrieve(&dirs, 60), Some(second));
}
