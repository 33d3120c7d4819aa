use crate::HashError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Path relative to the package root, `/`-separated, no leading separator.
///
/// Ordering is plain byte ordering of the path, independent of the host's
/// separator and of directory iteration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath(Vec<u8>);

impl NormalizedPath {
    /// Normalize a path relative to the package root.
    pub fn from_relative(relative: &Path) -> Self {
        let mut bytes = Vec::new();
        for component in relative.components() {
            if let Component::Normal(part) = component {
                if !bytes.is_empty() {
                    bytes.push(b'/');
                }
                bytes.extend_from_slice(&os_bytes(part));
            }
        }
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(unix)]
fn os_bytes(part: &std::ffi::OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    part.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_bytes(part: &std::ffi::OsStr) -> Vec<u8> {
    part.to_string_lossy().into_owned().into_bytes()
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for NormalizedPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A regular file discovered under the package root.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub absolute: PathBuf,
    pub path: NormalizedPath,
}

/// Lazily enumerate every regular file under `root`.
///
/// Directories are descended into but not yielded. Symbolic links are not
/// followed and not yielded.
pub fn regular_files(root: &Path) -> impl Iterator<Item = Result<PendingFile, HashError>> + '_ {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(move |entry| match entry {
            Err(source) => Some(Err(HashError::Walk {
                path: source.path().unwrap_or(root).to_path_buf(),
                source,
            })),
            Ok(entry) if entry.file_type().is_file() => {
                let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
                Some(Ok(PendingFile {
                    path: NormalizedPath::from_relative(relative),
                    absolute: entry.into_path(),
                }))
            }
            Ok(_) => None,
        })
}
