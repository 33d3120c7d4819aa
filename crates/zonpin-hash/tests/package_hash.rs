//! Package hash properties over real directory trees.

use std::fs;
use std::path::Path;
use zonpin_hash::{
    compute_package_hash, compute_package_hash_with, hash_file_tree, hash_files, package_hash,
    regular_files, HashError, HashOptions,
};
use zonpin_schema::PackageHash;

/// Known answer for [`write_sample_tree`], computed independently.
const SAMPLE_HASH: &str = "122072da4db44065a11af631ad10f16bafa6eb60c9625fda1e75ab96900352b976fe";

fn write_sample_tree(root: &Path) {
    fs::create_dir_all(root.join("bin")).unwrap();
    fs::create_dir_all(root.join("src/lib")).unwrap();
    fs::write(root.join("hello.txt"), "hello\n").unwrap();
    fs::write(root.join("bin/run.sh"), "#!/bin/sh\necho hi\n").unwrap();
    fs::write(root.join("src/lib/a.zig"), "const a = 1;\n").unwrap();
    set_mode(&root.join("hello.txt"), 0o644);
    set_mode(&root.join("bin/run.sh"), 0o755);
    set_mode(&root.join("src/lib/a.zig"), 0o644);
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

fn sample() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_sample_tree(dir.path());
    dir
}

#[cfg(unix)]
#[test]
fn matches_known_answer() {
    let dir = sample();
    let hash = compute_package_hash(dir.path()).unwrap();
    assert_eq!(hash.as_str(), SAMPLE_HASH);
}

#[test]
fn header_and_length() {
    let dir = sample();
    let hash = compute_package_hash(dir.path()).unwrap();
    assert!(hash.starts_with("1220"));
    assert_eq!(hash.len(), 68);
    assert!(hash.digest_hex().bytes().all(|b| b.is_ascii_hexdigit()));
    assert_eq!(PackageHash::parse(hash.as_str()).unwrap(), hash);
}

#[test]
fn deterministic_across_runs_and_worker_counts() {
    let dir = sample();
    let first = compute_package_hash(dir.path()).unwrap();
    for workers in [1, 2, 7, 32] {
        let options = HashOptions::default().with_workers(workers);
        assert_eq!(compute_package_hash_with(dir.path(), &options).unwrap(), first);
    }
}

#[test]
fn enumeration_order_does_not_matter() {
    let dir = sample();
    let mut forward: Vec<_> = regular_files(dir.path()).map(Result::unwrap).collect();
    forward.sort_by(|a, b| a.path.cmp(&b.path));
    let mut reversed = forward.clone();
    reversed.reverse();

    let digest_of = |files: Vec<zonpin_hash::PendingFile>| {
        let mut hashed: Vec<_> = hash_files(&files, 3)
            .unwrap()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        hashed.sort_by(|a, b| a.path.cmp(&b.path));
        package_hash(&hashed)
    };
    let a = digest_of(forward);
    let b = digest_of(reversed);
    assert_eq!(a, b);
    assert_eq!(a, compute_package_hash(dir.path()).unwrap());
}

#[test]
fn same_tree_in_different_locations_agrees() {
    let a = sample();
    let b = sample();
    assert_eq!(
        compute_package_hash(a.path()).unwrap(),
        compute_package_hash(b.path()).unwrap()
    );
}

#[test]
fn single_byte_change_changes_hash() {
    let dir = sample();
    let before = compute_package_hash(dir.path()).unwrap();
    fs::write(dir.path().join("src/lib/a.zig"), "const a = 2;\n").unwrap();
    assert_ne!(compute_package_hash(dir.path()).unwrap(), before);
}

#[test]
fn rename_changes_hash() {
    let dir = sample();
    let before = compute_package_hash(dir.path()).unwrap();
    fs::rename(dir.path().join("hello.txt"), dir.path().join("hello2.txt")).unwrap();
    assert_ne!(compute_package_hash(dir.path()).unwrap(), before);
}

#[test]
fn moving_between_directories_changes_hash() {
    let dir = sample();
    let before = compute_package_hash(dir.path()).unwrap();
    fs::rename(dir.path().join("hello.txt"), dir.path().join("bin/hello.txt")).unwrap();
    assert_ne!(compute_package_hash(dir.path()).unwrap(), before);
}

#[test]
fn empty_directories_do_not_count() {
    let dir = sample();
    let before = compute_package_hash(dir.path()).unwrap();
    fs::create_dir_all(dir.path().join("docs/empty")).unwrap();
    assert_eq!(compute_package_hash(dir.path()).unwrap(), before);
}

#[cfg(unix)]
#[test]
fn toggling_owner_execute_changes_hash() {
    let dir = sample();
    let before = compute_package_hash(dir.path()).unwrap();
    set_mode(&dir.path().join("hello.txt"), 0o744);
    let after = compute_package_hash(dir.path()).unwrap();
    assert_ne!(after, before);
    set_mode(&dir.path().join("hello.txt"), 0o644);
    assert_eq!(compute_package_hash(dir.path()).unwrap(), before);
}

#[cfg(unix)]
#[test]
fn unreadable_files_fail_with_smallest_path() {
    use std::os::unix::fs::PermissionsExt;
    let dir = sample();
    for name in ["zz", "mm", "bb"] {
        let path = dir.path().join(name);
        fs::write(&path, name).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();
    }
    // Permission bits do not stop root from reading.
    if fs::File::open(dir.path().join("bb")).is_ok() {
        return;
    }
    for workers in [1, 4] {
        let options = HashOptions::default().with_workers(workers);
        let err = hash_file_tree(dir.path(), &options).unwrap_err();
        match err {
            HashError::FileOpen { path, .. } => assert_eq!(path, "bb"),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
