use crate::CoreError;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Directory under the system temp dir holding manifest lock files.
pub const LOCK_DIR: &str = "zonpin-locks";

/// Exclusive advisory lock held for a manifest's read-modify-write cycle.
///
/// The lock file lives outside the package tree, under the system temp dir,
/// named after the manifest's canonical path. A file next to the manifest
/// would become part of the package and change its hash.
pub struct ManifestLock {
    lock_file: File,
}

/// Lock file path for `manifest`; every spelling of the same file maps to
/// the same lock.
pub fn lock_path_for(manifest: &Path) -> PathBuf {
    let canonical = std::fs::canonicalize(manifest)
        .or_else(|_| std::path::absolute(manifest))
        .unwrap_or_else(|_| manifest.to_path_buf());
    let digest = Sha256::digest(canonical.to_string_lossy().as_bytes());
    std::env::temp_dir()
        .join(LOCK_DIR)
        .join(format!("{}.lock", hex::encode(digest)))
}

fn open_lock_file(lock_path: &Path) -> Result<File, CoreError> {
    if let Some(dir) = lock_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?)
}

impl ManifestLock {
    pub fn acquire(manifest: &Path) -> Result<Self, CoreError> {
        let lock_path = lock_path_for(manifest);
        let file = open_lock_file(&lock_path)?;
        file.lock_exclusive()
            .map_err(|e| CoreError::Lock(format!("{}: {e}", lock_path.display())))?;
        Ok(Self { lock_file: file })
    }

    pub fn try_acquire(manifest: &Path) -> Result<Option<Self>, CoreError> {
        let file = open_lock_file(&lock_path_for(manifest))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { lock_file: file })),
            Err(_) => Ok(None),
        }
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_is_outside_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("build.zig.zon");
        std::fs::write(&manifest, ".{}").unwrap();
        let lock = lock_path_for(&manifest);
        assert!(lock.starts_with(std::env::temp_dir().join(LOCK_DIR)));
        assert_ne!(lock.parent(), Some(dir.path()));
    }

    #[test]
    fn lock_path_is_stable_across_spellings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let manifest = dir.path().join("build.zig.zon");
        std::fs::write(&manifest, ".{}").unwrap();
        let other = dir.path().join("sub/../build.zig.zon");
        assert_eq!(lock_path_for(&manifest), lock_path_for(&other));
        assert_ne!(
            lock_path_for(&manifest),
            lock_path_for(&dir.path().join("other.zon"))
        );
    }

    #[test]
    fn lock_leaves_manifest_dir_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("build.zig.zon");
        std::fs::write(&manifest, ".{}").unwrap();
        {
            let _lock = ManifestLock::acquire(&manifest).unwrap();
            assert!(lock_path_for(&manifest).exists());
        }
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, ["build.zig.zon"]);
    }

    #[test]
    fn try_acquire_returns_none_when_held() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("build.zig.zon");

        let _lock = ManifestLock::acquire(&manifest).unwrap();
        let result = ManifestLock::try_acquire(&manifest).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("build.zig.zon");

        {
            let _lock = ManifestLock::acquire(&manifest).unwrap();
        }

        let lock2 = ManifestLock::try_acquire(&manifest).unwrap();
        assert!(lock2.is_some());
    }
}
