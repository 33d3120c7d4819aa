use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;
use zonpin_core::{format_manifest, Config};

pub fn run(manifest: &Path, config: &Config, check: bool, json: bool) -> Result<u8, String> {
    let changed = format_manifest(manifest, config, check).map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "manifest": manifest,
            "check": check,
            "changed": changed,
        });
        println!("{}", json_pretty(&payload)?);
    } else if check && changed {
        println!("{} is not in canonical form", manifest.display());
    } else if changed {
        println!("formatted {}", manifest.display());
    }

    if check && changed {
        Ok(EXIT_FAILURE)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
