use clap::Parser;
use dupsweep::cache::{CacheRecord, PersistentCache};
use dupsweep::cli::Cli;
use dupsweep::duplicates::DuplicateFinder;
use dupsweep::error::ExitCode;
use dupsweep::run_app;
use dupsweep::scanner::DirectorySet;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Run with an empty config file unless the caller passes `--config`, so the
/// user's own platform config never leaks into a test.
fn try_run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let config_dir = tempdir()?;
    let empty = config_dir.path().join("config.toml");
    fs::write(&empty, "")?;

    let mut argv = vec!["dupsweep"];
    if !args.contains(&"--config") {
        argv.extend(["--config", s(&empty)]);
    }
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv)?)
}

fn run(args: &[&str]) -> ExitCode {
    try_run(args).unwrap()
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_find_then_show_uses_cache() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::write(data.path().join("a"), b"dup").unwrap();
    fs::write(data.path().join("b"), b"dup").unwrap();

    let code = run(&["-q", "--cache-dir", s(cache.path()), "find", s(data.path())]);
    assert_eq!(code, ExitCode::Success);

    let dirs = DirectorySet::new([data.path()]).unwrap();
    let store = PersistentCache::new(cache.path());
    assert!(store.retrieve(&dirs, 60).is_some());

    let code = run(&[
        "-q",
        "--cache-dir",
        s(cache.path()),
        "show",
        s(data.path()),
        "--output",
        "json",
    ]);
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_show_miss_is_an_error_code() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let code = run(&["-q", "--cache-dir", s(cache.path()), "show", s(data.path())]);
    assert_eq!(code, ExitCode::GeneralError);
}

#[test]
fn test_find_without_duplicates() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::write(data.path().join("a"), b"one").unwrap();
    fs::write(data.path().join("b"), b"four").unwrap();

    let code = run(&[
        "-q",
        "--cache-dir",
        s(cache.path()),
        "find",
        s(data.path()),
        "--no-cache",
    ]);
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(PersistentCache::new(cache.path()).clear().removed.is_empty());
}

#[test]
fn test_delete_dry_run_then_real() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let d1 = root.path().join("d1");
    let d2 = root.path().join("d2");
    fs::create_dir(&d1).unwrap();
    fs::create_dir(&d2).unwrap();
    fs::write(d1.join("a.txt"), b"abcd").unwrap();
    fs::write(d2.join("c.txt"), b"abcd").unwrap();

    let base = ["-q", "--cache-dir", s(cache.path()), "delete", s(&d1), s(&d2)];

    let mut dry = base.to_vec();
    dry.extend(["--delete-dirs", s(&d1), "--dry-run"]);
    assert_eq!(run(&dry), ExitCode::Success);
    assert!(d1.join("a.txt").exists());

    let dirs = DirectorySet::new([&d1, &d2]).unwrap();
    assert!(PersistentCache::new(cache.path())
        .retrieve(&dirs, 60)
        .is_some());

    let mut real = base.to_vec();
    real.extend(["--delete-dirs", s(&d1), "--output", "json"]);
    assert_eq!(run(&real), ExitCode::Success);
    assert!(!d1.join("a.txt").exists());
    assert!(d2.join("c.txt").exists());

    // Index is stale after a real deletion
    assert!(PersistentCache::new(cache.path())
        .retrieve(&dirs, 60)
        .is_none());
}

#[test]
fn test_invalid_pattern_is_an_error() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let err = try_run(&[
        "-q",
        "--cache-dir",
        s(cache.path()),
        "delete",
        s(data.path()),
        "--delete-patterns",
        "[oops",
    ])
    .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("[oops"));
}

#[test]
fn test_missing_directory_is_an_error() {
    let cache = tempdir().unwrap();
    let missing = cache.path().join("nope");
    assert!(try_run(&["-q", "--cache-dir", s(cache.path()), "find", s(&missing)]).is_err());
}

#[test]
fn test_broken_explicit_config_aborts_before_deleting() {
    let root = tempdir().unwrap();
    let cache = tempdir().unwrap();
    let d1 = root.path().join("d1");
    let d2 = root.path().join("d2");
    fs::create_dir(&d1).unwrap();
    fs::create_dir(&d2).unwrap();
    fs::write(d1.join("a.txt"), b"abcd").unwrap();
    fs::write(d2.join("c.txt"), b"abcd").unwrap();
    let config = root.path().join("config.toml");
    fs::write(&config, "trash = true\nio_threads = \"eight\"\n").unwrap();

    let err = try_run(&[
        "-q",
        "--config",
        s(&config),
        "--cache-dir",
        s(cache.path()),
        "delete",
        s(&d1),
        s(&d2),
        "--delete-dirs",
        s(&d1),
    ])
    .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("configuration"));
    assert!(d1.join("a.txt").exists());
}

#[test]
fn test_oversized_chunk_size_is_an_error() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::write(data.path().join("a"), b"tiny").unwrap();
    fs::write(data.path().join("b"), b"tiny").unwrap();

    let err = try_run(&[
        "-q",
        "--cache-dir",
        s(cache.path()),
        "find",
        s(data.path()),
        "--chunk-size",
        "64TiB",
    ])
    .unwrap_err();
    assert!(format!("{err:#}").contains("chunk size"));
}

#[test]
fn test_show_and_delete_have_separate_thresholds() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::write(data.path().join("a"), b"dup").unwrap();
    fs::write(data.path().join("b"), b"dup").unwrap();

    // A two-hour-old scan of the tree, which still lists both files
    let dirs = DirectorySet::new([data.path()]).unwrap();
    let index = DuplicateFinder::with_defaults()
        .find_duplicates(&dirs)
        .unwrap()
        .index;
    let store = PersistentCache::new(cache.path());
    let created = chrono::Utc::now() - chrono::Duration::hours(2);
    store
        .write_record(&CacheRecord::with_created_at(index, created))
        .unwrap();

    // show accepts a day-old result by default
    assert_eq!(
        run(&["-q", "--cache-dir", s(cache.path()), "show", s(data.path())]),
        ExitCode::Success
    );

    // delete only trusts an hour, so it rescans and stores a fresh record
    assert_eq!(
        run(&[
            "-q",
            "--cache-dir",
            s(cache.path()),
            "delete",
            s(data.path()),
            "--delete-patterns",
            "b",
            "--dry-run",
        ]),
        ExitCode::Success
    );
    let record = store.load(&dirs).unwrap().unwrap();
    assert!(record.created_at > created + chrono::Duration::minutes(90));
}

#[test]
fn test_clear_cache_command() {
    let data = tempdir().unwrap();
    let cache = tempdir().unwrap();
    fs::write(data.path().join("a"), b"dup").unwrap();
    fs::write(data.path().join("b"), b"dup").unwrap();
    run(&["-q", "--cache-dir", s(cache.path()), "find", s(data.path())]);

    assert_eq!(
        run(&["-q", "--cache-dir", s(cache.path()), "clear-cache", "--dry-run"]),
        ExitCode::Success
    );
    let dirs = DirectorySet::new([data.path()]).unwrap();
    assert!(PersistentCache::new(cache.path())
        .retrieve(&dirs, 60)
        .is_some());

    assert_eq!(
        run(&["-q", "--cache-dir", s(cache.path()), "clear-cache"]),
        ExitCode::Success
    );
    assert!(PersistentCache::new(cache.path())
        .retrieve(&dirs, 60)
        .is_none());
}
