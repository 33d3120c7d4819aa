//! Deterministic package hashing over extracted dependency trees for zonpin.
//!
//! Every regular file under a package root is hashed as
//! `SHA256(path || 0x00 || exec_bit || contents)` on a rayon thread pool.
//! The per-file digests are sorted by normalized path and folded into one
//! SHA-256, which is published as `"1220"` followed by the hex digest
//! (`PackageHash`).

pub mod file;
pub mod pool;
pub mod walk;

pub use file::{hash_file, is_owner_executable, HashedFile};
pub use pool::hash_files;
pub use walk::{regular_files, NormalizedPath, PendingFile};

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;
use zonpin_schema::PackageHash;

/// Upper bound for the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 16;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("cannot walk '{}': {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot open '{path}': {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot read '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("package root '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot start hashing threads: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOptions {
    /// Number of files hashed concurrently.
    pub workers: usize,
}

impl Default for HashOptions {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map_or(4, std::num::NonZeroUsize::get)
            .clamp(1, MAX_DEFAULT_WORKERS);
        Self { workers }
    }
}

impl HashOptions {
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Compute the package hash of the tree at `root` with default options.
pub fn compute_package_hash(root: &Path) -> Result<PackageHash, HashError> {
    compute_package_hash_with(root, &HashOptions::default())
}

pub fn compute_package_hash_with(
    root: &Path,
    options: &HashOptions,
) -> Result<PackageHash, HashError> {
    let files = hash_file_tree(root, options)?;
    Ok(package_hash(&files))
}

/// Hash every regular file under `root`, sorted by normalized path.
///
/// When several files fail, the error reported is the one belonging to the
/// byte-wise smallest normalized path, so the outcome does not depend on
/// which worker finished first.
pub fn hash_file_tree(root: &Path, options: &HashOptions) -> Result<Vec<HashedFile>, HashError> {
    let started = Instant::now();
    debug!(
        "hashing {} with {} worker(s)",
        root.display(),
        options.workers
    );

    if std::fs::metadata(root).is_ok_and(|meta| !meta.is_dir()) {
        return Err(HashError::NotADirectory(root.to_path_buf()));
    }

    let mut pending = regular_files(root).collect::<Result<Vec<_>, _>>()?;
    pending.sort_by(|a, b| a.path.cmp(&b.path));
    let files = hash_files(&pending, options.workers)?
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "hashed {} file(s) under {} in {:?}",
        files.len(),
        root.display(),
        started.elapsed()
    );
    Ok(files)
}

/// Fold per-file digests into the package identifier.
///
/// `files` must already be sorted by path, as returned by [`hash_file_tree`].
pub fn package_hash(files: &[HashedFile]) -> PackageHash {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.digest);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    PackageHash::from_digest(&digest)
}
