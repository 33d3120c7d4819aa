use crate::file::{hash_file, HashedFile};
use crate::walk::PendingFile;
use crate::HashError;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

/// Hash `files` on a dedicated pool of `workers` threads.
///
/// Results come back in the order of `files`; a file that cannot be hashed
/// yields its error in place so the caller decides which one wins.
pub fn hash_files(
    files: &[PendingFile],
    workers: usize,
) -> Result<Vec<Result<HashedFile, HashError>>, HashError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("zonpin-hash-{i}"))
        .build()?;
    Ok(pool.install(|| files.par_iter().map(hash_file).collect()))
}
