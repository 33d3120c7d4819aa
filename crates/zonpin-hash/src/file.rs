use crate::walk::{NormalizedPath, PendingFile};
use crate::HashError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{File, Metadata};
use std::io;

/// Per-file result feeding the package digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashedFile {
    pub path: NormalizedPath,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub digest: [u8; 32],
    pub executable: bool,
}

/// Only the owner-execute bit counts; group and other bits are ignored.
#[cfg(unix)]
pub fn is_owner_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
pub fn is_owner_executable(_meta: &Metadata) -> bool {
    false
}

/// `SHA256(path || 0x00 || exec_bit || contents)`.
pub fn hash_file(pending: &PendingFile) -> Result<HashedFile, HashError> {
    let mut file = File::open(&pending.absolute).map_err(|source| HashError::FileOpen {
        path: pending.path.to_string(),
        source,
    })?;
    let meta = file.metadata().map_err(|source| HashError::FileRead {
        path: pending.path.to_string(),
        source,
    })?;
    let executable = is_owner_executable(&meta);

    let mut hasher = Sha256::new();
    hasher.update(pending.path.as_bytes());
    hasher.update([0u8, u8::from(executable)]);
    io::copy(&mut file, &mut hasher).map_err(|source| HashError::FileRead {
        path: pending.path.to_string(),
        source,
    })?;

    Ok(HashedFile {
        path: pending.path.clone(),
        digest: hasher.finalize().into(),
        executable,
    })
}
