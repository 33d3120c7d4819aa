use super::{json_pretty, local_fetcher, print_outcome, spinner, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;
use zonpin_core::{update_manifest, Config, DependencyStatus, UpdateOptions};

pub fn run(
    manifest: &Path,
    sources: &[String],
    options: &UpdateOptions,
    config: &Config,
    json: bool,
) -> Result<u8, String> {
    let fetcher = local_fetcher(sources)?;

    let pb = (!json).then(|| spinner(&format!("updating {}", manifest.display())));
    let result = update_manifest(manifest, &fetcher, options, config);
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
        let updated = report.count(DependencyStatus::Updated);
        if report.written {
            println!("wrote {updated} updated hash(es)");
        } else if options.dry_run && updated > 0 {
            println!("dry run: {updated} hash(es) would change");
        } else {
            println!("manifest unchanged");
        }
    }

    if report.has_failures() {
        Ok(EXIT_FAILURE)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
