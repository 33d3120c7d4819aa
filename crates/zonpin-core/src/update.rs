use crate::concurrency::ManifestLock;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::CoreError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zonpin_hash::compute_package_hash_with;
use zonpin_schema::{
    parse_manifest_str, write_manifest_file, Dependency, Manifest, ManifestError, PackageHash,
};

#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Restrict the run to these dependencies; empty means all of them.
    pub only: Vec<String>,
    /// Record failing dependencies and continue instead of aborting.
    pub keep_going: bool,
    /// Compute everything but leave the manifest file untouched.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// Hash written (changed or newly added).
    Updated,
    /// Recomputed hash equals the stored one.
    Unchanged,
    /// Stored hash differs from the recomputed one (verify only).
    Mismatch,
    /// No stored hash to compare against (verify only).
    Missing,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyOutcome {
    pub name: String,
    pub status: DependencyStatus,
    pub stored: Option<String>,
    pub computed: Option<PackageHash>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub manifest: PathBuf,
    pub dependencies: Vec<DependencyOutcome>,
    /// Whether the manifest file was rewritten.
    pub written: bool,
}

impl UpdateReport {
    pub fn count(&self, status: DependencyStatus) -> usize {
        self.dependencies
            .iter()
            .filter(|d| d.status == status)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(DependencyStatus::Failed) > 0
    }

    /// True when every dependency checked out (verify) or was processed
    /// without failure (update).
    pub fn is_clean(&self) -> bool {
        self.dependencies.iter().all(|d| {
            matches!(
                d.status,
                DependencyStatus::Updated | DependencyStatus::Unchanged
            )
        })
    }
}

fn select(manifest: &Manifest, only: &[String]) -> Result<Vec<Dependency>, CoreError> {
    if only.is_empty() {
        return Ok(manifest.dependencies()?);
    }
    only.iter()
        .map(|name| manifest.dependency(name).map_err(CoreError::from))
        .collect()
}

fn compute(
    dep: &Dependency,
    fetcher: &dyn Fetcher,
    config: &Config,
) -> Result<PackageHash, CoreError> {
    let url = dep.require_url()?;
    let tree = fetcher.fetch(&dep.name, url)?;
    debug!("hashing {} from {}", dep.name, tree.path().display());
    Ok(compute_package_hash_with(tree.path(), &config.hash_options())?)
}

fn failed(dep: &Dependency, error: &CoreError) -> DependencyOutcome {
    DependencyOutcome {
        name: dep.name.to_string(),
        status: DependencyStatus::Failed,
        stored: dep.hash.clone(),
        computed: None,
        error: Some(error.to_string()),
    }
}

/// Recompute and store the hash of each selected dependency.
///
/// The manifest is locked for the whole cycle and rewritten only when at
/// least one hash changed. Without `keep_going` the first failing dependency
/// aborts the run and the file is left untouched; with it, failures are
/// reported and the successful updates are still written.
pub fn update_manifest(
    path: &Path,
    fetcher: &dyn Fetcher,
    options: &UpdateOptions,
    config: &Config,
) -> Result<UpdateReport, CoreError> {
    let _lock = ManifestLock::acquire(path)?;
    let text = std::fs::read_to_string(path).map_err(ManifestError::from)?;
    let mut manifest = parse_manifest_str(&text)?;
    let deps = select(&manifest, &options.only)?;
    info!(
        "updating {} dependenc(ies) in {}",
        deps.len(),
        path.display()
    );

    let mut outcomes = Vec::with_capacity(deps.len());
    for dep in &deps {
        let hash = match compute(dep, fetcher, config) {
            Ok(hash) => hash,
            Err(e) if options.keep_going => {
                warn!("{}: {e}", dep.name);
                outcomes.push(failed(dep, &e));
                continue;
            }
            Err(e) => {
                return Err(CoreError::Dependency {
                    name: dep.name.to_string(),
                    source: Box::new(e),
                })
            }
        };

        let status = if dep.hash.as_deref() == Some(hash.as_str()) {
            DependencyStatus::Unchanged
        } else {
            manifest.set_dependency_hash(&dep.name, &hash)?;
            info!("{}: {}", dep.name, hash);
            DependencyStatus::Updated
        };
        outcomes.push(DependencyOutcome {
            name: dep.name.to_string(),
            status,
            stored: dep.hash.clone(),
            computed: Some(hash),
            error: None,
        });
    }

    let changed = outcomes
        .iter()
        .any(|o| o.status == DependencyStatus::Updated);
    let written = changed && !options.dry_run;
    if written {
        write_manifest_file(path, &manifest.render_with_indent(config.indent_unit()))?;
    }

    Ok(UpdateReport {
        manifest: path.to_path_buf(),
        dependencies: outcomes,
        written,
    })
}

/// Recompute each selected dependency's hash and compare it with the stored
/// value. Never writes.
pub fn verify_manifest(
    path: &Path,
    fetcher: &dyn Fetcher,
    only: &[String],
    config: &Config,
) -> Result<UpdateReport, CoreError> {
    let text = std::fs::read_to_string(path).map_err(ManifestError::from)?;
    let manifest = parse_manifest_str(&text)?;
    let deps = select(&manifest, only)?;

    let outcomes = deps
        .iter()
        .map(|dep| match compute(dep, fetcher, config) {
            Err(e) => {
                warn!("{}: {e}", dep.name);
                failed(dep, &e)
            }
            Ok(hash) => {
                let status = match dep.hash.as_deref() {
                    None => DependencyStatus::Missing,
                    Some(stored) if stored == hash.as_str() => DependencyStatus::Unchanged,
                    Some(_) => DependencyStatus::Mismatch,
                };
                DependencyOutcome {
                    name: dep.name.to_string(),
                    status,
                    stored: dep.hash.clone(),
                    computed: Some(hash),
                    error: None,
                }
            }
        })
        .collect();

    Ok(UpdateReport {
        manifest: path.to_path_buf(),
        dependencies: outcomes,
        written: false,
    })
}
