use dupsweep::duplicates::{DuplicateFinder, FinderConfig, SizeOrder, ViewOrder};
use dupsweep::scanner::{DirectorySet, PathSetError, DEFAULT_CHUNK_SIZE};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();

    assert!(!outcome.index.has_duplicates());
    assert!(outcome.index.empty_files().is_empty());
    assert_eq!(outcome.summary.total_files, 0);
    assert!(!outcome.is_partial());
}

#[test]
fn test_scan_groups_by_size_and_content() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"duplicate").unwrap();
    fs::write(dir.path().join("b.txt"), b"duplicate").unwrap();
    fs::write(dir.path().join("c.txt"), b"duplicatf").unwrap();
    fs::write(dir.path().join("d.txt"), b"unique content").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();

    let root = canonical(dir.path());
    assert_eq!(outcome.index.group_count(), 1);
    let group = outcome.index.groups().next().unwrap();
    assert_eq!(group.size, 9);
    assert_eq!(group.paths, vec![root.join("a.txt"), root.join("b.txt")]);
    assert!(outcome.index.group_of(&root.join("c.txt")).is_none());
    assert_eq!(outcome.summary.total_files, 4);
    assert_eq!(outcome.summary.eliminated_by_size, 1);
    assert_eq!(outcome.summary.hashed_files, 3);
}

#[test]
fn test_chunk_boundary_contents_are_distinguished() {
    let dir = tempdir().unwrap();
    let chunk = DEFAULT_CHUNK_SIZE;

    let exact = vec![b'x'; chunk];
    let mut exact_other = exact.clone();
    exact_other[chunk - 1] = b'y';
    let plus_one = vec![b'x'; chunk + 1];
    let mut plus_one_other = plus_one.clone();
    plus_one_other[chunk] = b'y';

    fs::write(dir.path().join("exact_1"), &exact).unwrap();
    fs::write(dir.path().join("exact_2"), &exact).unwrap();
    fs::write(dir.path().join("exact_3"), &exact_other).unwrap();
    fs::write(dir.path().join("plus_1"), &plus_one).unwrap();
    fs::write(dir.path().join("plus_2"), &plus_one).unwrap();
    fs::write(dir.path().join("plus_3"), &plus_one_other).unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();
    let root = canonical(dir.path());

    assert_eq!(outcome.index.group_count(), 2);
    let exact_group = &outcome.index.by_size()[&(chunk as u64)][0];
    assert_eq!(
        exact_group.paths,
        vec![root.join("exact_1"), root.join("exact_2")]
    );
    let plus_group = &outcome.index.by_size()[&(chunk as u64 + 1)][0];
    assert_eq!(plus_group.paths, vec![root.join("plus_1"), root.join("plus_2")]);
}

#[test]
fn test_small_chunk_size_gives_same_result() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(name), vec![7u8; 10_000]).unwrap();
    }

    let default = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();
    let tiny = DuplicateFinder::new(FinderConfig::default().with_chunk_size(3))
        .unwrap()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();

    assert_eq!(default.index, tiny.index);
}

#[test]
fn test_zero_byte_files_are_only_empty() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("e1"), b"").unwrap();
    fs::write(dir.path().join("e2"), b"").unwrap();
    fs::write(dir.path().join("x"), b"x").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();
    let root = canonical(dir.path());

    assert!(!outcome.index.has_duplicates());
    assert_eq!(
        outcome.index.empty_files(),
        &[root.join("e1"), root.join("e2")]
    );
    assert!(outcome.index.by_size().get(&0).is_none());
    assert_eq!(outcome.summary.empty_files, 2);
}

#[test]
fn test_scanning_twice_gives_equal_index() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        fs::write(dir.path().join(name), format!("content {}", i % 2)).unwrap();
        fs::write(sub.join(name), format!("content {}", i % 2)).unwrap();
    }

    let finder = DuplicateFinder::with_defaults();
    let first = finder.find_duplicates_in_paths([dir.path()]).unwrap();
    let second = finder.find_duplicates_in_paths([dir.path()]).unwrap();

    assert_eq!(first.index, second.index);
    assert_eq!(first.index.group_count(), 2);
}

#[test]
fn test_nested_and_repeated_inputs_are_scanned_once() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("a.txt"), b"content").unwrap();
    fs::write(sub.join("b.txt"), b"content").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path(), sub.as_path(), dir.path()])
        .unwrap();

    assert_eq!(outcome.index.dirs().len(), 1);
    assert_eq!(outcome.summary.total_files, 2);
    let group = outcome.index.groups().next().unwrap();
    assert_eq!(group.len(), 2);
}

#[test]
fn test_duplicates_across_directories() {
    let d1 = tempdir().unwrap();
    let d2 = tempdir().unwrap();
    fs::write(d1.path().join("a.txt"), b"abcd").unwrap();
    fs::write(d1.path().join("b.txt"), b"abcd").unwrap();
    fs::write(d2.path().join("c.txt"), b"abcd").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([d1.path(), d2.path()])
        .unwrap();

    assert_eq!(outcome.index.group_count(), 1);
    let group = outcome.index.groups().next().unwrap();
    assert_eq!(group.size, 4);
    let mut expected = vec![
        canonical(d1.path()).join("a.txt"),
        canonical(d1.path()).join("b.txt"),
        canonical(d2.path()).join("c.txt"),
    ];
    expected.sort();
    let mut actual = group.paths.clone();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, b"x").unwrap();

    assert!(matches!(
        DirectorySet::new(Vec::<PathBuf>::new()),
        Err(PathSetError::Empty)
    ));
    assert!(matches!(
        DirectorySet::new([dir.path().join("missing")]),
        Err(PathSetError::NotFound(_))
    ));
    assert!(matches!(
        DirectorySet::new([&file]),
        Err(PathSetError::NotADirectory(_))
    ));
}

#[test]
fn test_ordered_view_does_not_mutate_index() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("s1"), b"ab").unwrap();
    fs::write(dir.path().join("s2"), b"ab").unwrap();
    fs::write(dir.path().join("l1"), b"abcdef").unwrap();
    fs::write(dir.path().join("l2"), b"abcdef").unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();
    let before = outcome.index.clone();

    let desc = outcome.index.ordered(ViewOrder::sorted(SizeOrder::Descending));
    let asc = outcome.index.ordered(ViewOrder::sorted(SizeOrder::Ascending));

    assert_eq!(desc.groups[0].size, 6);
    assert_eq!(asc.groups[0].size, 2);
    assert_eq!(outcome.index, before);
}

#[test]
#[cfg(unix)]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), b"content").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates_in_paths([dir.path()])
        .unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert!(!outcome.index.has_duplicates());
}
