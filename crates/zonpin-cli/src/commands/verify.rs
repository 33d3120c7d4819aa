use super::{
    json_pretty, local_fetcher, print_outcome, spinner, EXIT_FAILURE, EXIT_HASH_ERROR,
    EXIT_SUCCESS,
};
use std::path::Path;
use zonpin_core::{verify_manifest, Config, DependencyStatus};

pub fn run(
    manifest: &Path,
    sources: &[String],
    only: &[String],
    config: &Config,
    json: bool,
) -> Result<u8, String> {
    let fetcher = local_fetcher(sources)?;

    let pb = (!json).then(|| spinner(&format!("verifying {}", manifest.display())));
    let result = verify_manifest(manifest, &fetcher, only, config);
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let report = result.map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!("{}", manifest.display());
        for outcome in &report.dependencies {
            print_outcome(outcome);
        }
    }

    let unpinned =
        report.count(DependencyStatus::Mismatch) + report.count(DependencyStatus::Missing);
    if unpinned > 0 {
        Ok(EXIT_HASH_ERROR)
    } else if report.has_failures() {
        Ok(EXIT_FAILURE)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
