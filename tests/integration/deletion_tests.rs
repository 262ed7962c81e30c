use dupsweep::actions::{
    DeleteConfig, DeleteError, DeletionPlanner, DeletionTarget,
};
use dupsweep::duplicates::{DuplicateFinder, DuplicateIndex};
use dupsweep::scanner::DirectorySet;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

struct Scenario {
    _root: TempDir,
    d1: PathBuf,
    d2: PathBuf,
    index: DuplicateIndex,
}

/// D1 = {a.txt, b.txt}, D2 = {c.txt}, all "abcd".
fn scenario() -> Scenario {
    let root = tempdir().unwrap();
    let base = root.path().canonicalize().unwrap();
    let d1 = base.join("d1");
    let d2 = base.join("d2");
    fs::create_dir(&d1).unwrap();
    fs::create_dir(&d2).unwrap();
    fs::write(d1.join("a.txt"), b"abcd").unwrap();
    fs::write(d1.join("b.txt"), b"abcd").unwrap();
    fs::write(d2.join("c.txt"), b"abcd").unwrap();

    let index = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([&d1, &d2])
        .unwrap()
        .index;
    Scenario {
        _root: root,
        d1,
        d2,
        index,
    }
}

fn dirs_target(dirs: &[&PathBuf]) -> DeletionTarget {
    DeletionTarget::Directories(DirectorySet::new(dirs).unwrap())
}

fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    paths
}

#[test]
fn test_scan_yields_one_group_of_three() {
    let s = scenario();
    assert_eq!(s.index.group_count(), 1);
    let group = s.index.groups().next().unwrap();
    assert_eq!(group.size, 4);
    assert_eq!(group.len(), 3);
}

#[test]
fn test_target_d1_deletes_d1_copies_and_keeps_d2() {
    let s = scenario();
    let plan = DeletionPlanner::new(dirs_target(&[&s.d1])).plan(&s.index);

    assert_eq!(plan.groups.len(), 1);
    assert_eq!(
        sorted(plan.groups[0].delete.clone()),
        vec![s.d1.join("a.txt"), s.d1.join("b.txt")]
    );
    assert_eq!(plan.groups[0].keep, vec![s.d2.join("c.txt")]);

    let report = plan.apply(&DeleteConfig::default());
    assert!(report.is_success());
    assert!(!s.d1.join("a.txt").exists());
    assert!(!s.d1.join("b.txt").exists());
    assert!(s.d2.join("c.txt").exists());
}

#[test]
fn test_all_targets_keep_smallest_path() {
    let s = scenario();
    let plan = DeletionPlanner::new(dirs_target(&[&s.d1, &s.d2])).plan(&s.index);

    assert_eq!(plan.groups[0].keep, vec![s.d1.join("a.txt")]);
    assert_eq!(
        sorted(plan.groups[0].delete.clone()),
        vec![s.d1.join("b.txt"), s.d2.join("c.txt")]
    );

    let report = plan.apply(&DeleteConfig::default());
    assert_eq!(report.deleted.len(), 2);
    assert!(s.d1.join("a.txt").exists());
    assert!(!s.d1.join("b.txt").exists());
    assert!(!s.d2.join("c.txt").exists());
}

#[test]
fn test_dry_run_reports_same_set_and_changes_nothing() {
    let s = scenario();
    let plan = DeletionPlanner::new(dirs_target(&[&s.d1, &s.d2])).plan(&s.index);

    let dry = plan.apply(&DeleteConfig::dry_run());
    for name in ["a.txt", "b.txt"] {
        assert!(s.d1.join(name).exists());
    }
    assert!(s.d2.join("c.txt").exists());

    let real = plan.apply(&DeleteConfig::default());
    assert_eq!(sorted(dry.deleted), sorted(real.deleted));
    assert_eq!(dry.bytes_freed, real.bytes_freed);
}

#[test]
fn test_survivor_invariant_holds_for_every_group() {
    let root = tempdir().unwrap();
    let base = root.path().canonicalize().unwrap();
    let (d1, d2) = (base.join("d1"), base.join("d2"));
    fs::create_dir(&d1).unwrap();
    fs::create_dir(&d2).unwrap();
    for i in 0..5 {
        let content = format!("group {i} payload");
        fs::write(d1.join(format!("f{i}_a")), &content).unwrap();
        fs::write(d1.join(format!("f{i}_b")), &content).unwrap();
        if i % 2 == 0 {
            fs::write(d2.join(format!("f{i}_c")), &content).unwrap();
        }
    }

    let index = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([&d1, &d2])
        .unwrap()
        .index;
    let plan = DeletionPlanner::new(dirs_target(&[&d1, &d2])).plan(&index);
    plan.apply(&DeleteConfig::default());

    for group in index.groups() {
        assert!(
            group.paths.iter().any(|p| p.exists()),
            "group {} lost every copy",
            group.hash_hex()
        );
    }
}

#[test]
fn test_second_apply_is_idempotent() {
    let s = scenario();
    let plan = DeletionPlanner::new(dirs_target(&[&s.d1])).plan(&s.index);

    assert_eq!(plan.apply(&DeleteConfig::default()).deleted.len(), 2);
    let again = plan.apply(&DeleteConfig::default());
    assert!(again.deleted.is_empty());
    assert!(again
        .failed
        .iter()
        .all(|(_, e)| matches!(e, DeleteError::NotFound(_))));
    assert!(s.d2.join("c.txt").exists());
}

#[test]
fn test_glob_pattern_targets() {
    let root = tempdir().unwrap();
    let base = root.path().canonicalize().unwrap();
    let nested = base.join("deep").join("er");
    fs::create_dir_all(&nested).unwrap();
    fs::write(base.join("common.txt"), b"shared").unwrap();
    fs::write(nested.join("common.txt"), b"shared").unwrap();
    fs::write(base.join("keep.txt"), b"other!").unwrap();
    fs::write(nested.join("file1.txt"), b"other!").unwrap();

    let index = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([&base])
        .unwrap()
        .index;
    assert_eq!(index.group_count(), 2);

    let target = DeletionTarget::patterns(["**/file*.txt"]).unwrap();
    let plan = DeletionPlanner::new(target).plan(&index);
    assert_eq!(plan.groups.len(), 1);
    assert_eq!(plan.groups[0].delete, vec![nested.join("file1.txt")]);
    assert_eq!(plan.groups[0].keep, vec![base.join("keep.txt")]);

    let target = DeletionTarget::patterns(["common.txt"]).unwrap();
    let plan = DeletionPlanner::new(target).plan(&index);
    assert_eq!(plan.groups.len(), 1);
    assert_eq!(plan.groups[0].keep.len(), 1);
    assert_eq!(plan.groups[0].delete.len(), 1);
}

#[test]
fn test_empty_files_are_deleted_without_survivor() {
    let root = tempdir().unwrap();
    let base = root.path().canonicalize().unwrap();
    fs::write(base.join("e1"), b"").unwrap();
    fs::write(base.join("e2"), b"").unwrap();

    let index = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([&base])
        .unwrap()
        .index;
    let target = DeletionTarget::Directories(DirectorySet::new([&base]).unwrap());

    let without = DeletionPlanner::new(target.clone()).plan(&index);
    assert!(without.is_empty());

    let plan = DeletionPlanner::new(target).include_empty(true).plan(&index);
    let report = plan.apply(&DeleteConfig::default());
    assert_eq!(report.deleted.len(), 2);
    assert!(!base.join("e1").exists());
    assert!(!base.join("e2").exists());
}

#[test]
fn test_modified_file_is_not_deleted() {
    let s = scenario();
    let plan = DeletionPlanner::new(dirs_target(&[&s.d1])).plan(&s.index);
    fs::write(s.d1.join("a.txt"), b"abcd plus more").unwrap();

    let report = plan.apply(&DeleteConfig::default());
    assert_eq!(report.deleted, vec![s.d1.join("b.txt")]);
    assert!(matches!(report.failed[0].1, DeleteError::Modified { .. }));
    assert!(s.d1.join("a.txt").exists());
}
