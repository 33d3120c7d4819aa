//! The seam to whatever turns a dependency URL into an extracted tree.
//!
//! Resolving, downloading and unpacking archives happens outside zonpin; the
//! update workflow only needs a directory to hash.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no source configured for dependency '{0}'")]
    NoSource(String),
    #[error("source for '{name}' is not a directory: {}", path.display())]
    NotADirectory { name: String, path: PathBuf },
    #[error("invalid source '{0}', expected '<name>=<dir>'")]
    InvalidSpec(String),
    #[error("fetching '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// An extracted dependency tree ready to hash.
///
/// When built from a [`TempDir`], the directory is removed once the tree is
/// dropped.
#[derive(Debug)]
pub struct FetchedTree {
    path: PathBuf,
    _temp: Option<TempDir>,
}

impl FetchedTree {
    /// A directory owned by someone else; nothing is cleaned up.
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _temp: None,
        }
    }

    /// A freshly extracted temporary directory.
    pub fn temporary(dir: TempDir) -> Self {
        Self {
            path: dir.path().to_path_buf(),
            _temp: Some(dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub trait Fetcher {
    /// Produce the extracted tree for dependency `name` published at `url`.
    fn fetch(&self, name: &str, url: &str) -> Result<FetchedTree, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str, &str) -> Result<FetchedTree, FetchError>,
{
    fn fetch(&self, name: &str, url: &str) -> Result<FetchedTree, FetchError> {
        self(name, url)
    }
}

/// Serves dependencies from directories already present on disk, keyed by
/// dependency name. The URL is ignored.
#[derive(Debug, Clone, Default)]
pub struct LocalFetcher {
    sources: BTreeMap<String, PathBuf>,
}

impl LocalFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source(mut self, name: &str, dir: impl Into<PathBuf>) -> Self {
        self.sources.insert(name.to_owned(), dir.into());
        self
    }

    /// Build from `name=dir` specs as given on the command line.
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Result<Self, FetchError> {
        specs.iter().try_fold(Self::new(), |fetcher, spec| {
            let spec = spec.as_ref();
            match spec.split_once('=') {
                Some((name, dir)) if !name.is_empty() && !dir.is_empty() => {
                    Ok(fetcher.with_source(name, dir))
                }
                _ => Err(FetchError::InvalidSpec(spec.to_owned())),
            }
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Fetcher for LocalFetcher {
    fn fetch(&self, name: &str, _url: &str) -> Result<FetchedTree, FetchError> {
        let dir = self
            .sources
            .get(name)
            .ok_or_else(|| FetchError::NoSource(name.to_owned()))?;
        if !dir.is_dir() {
            return Err(FetchError::NotADirectory {
                name: name.to_owned(),
                path: dir.clone(),
            });
        }
        Ok(FetchedTree::existing(dir.clone()))
    }
}
