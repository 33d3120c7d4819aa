//! Manifest workflows for zonpin.
//!
//! This crate ties the schema layer and the package hasher together: it
//! fetches each dependency through a [`Fetcher`], hashes the extracted tree,
//! and rewrites the manifest's `hash` fields under an exclusive file lock.
//! It also provides canonical formatting, read-only verification, and the
//! user configuration file.

pub mod concurrency;
pub mod config;
pub mod fetch;
pub mod format;
pub mod update;

pub use concurrency::{lock_path_for, ManifestLock};
pub use config::{Config, CONFIG_ENV};
pub use fetch::{FetchError, FetchedTree, Fetcher, LocalFetcher};
pub use format::format_manifest;
pub use update::{
    update_manifest, verify_manifest, DependencyOutcome, DependencyStatus, UpdateOptions,
    UpdateReport,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] zonpin_schema::ManifestError),
    #[error("hash error: {0}")]
    Hash(#[from] zonpin_hash::HashError),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("dependency '{name}': {source}")]
    Dependency {
        name: String,
        source: Box<CoreError>,
    },
    #[error("manifest lock: {0}")]
    Lock(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
