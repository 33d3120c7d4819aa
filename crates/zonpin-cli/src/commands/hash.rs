use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use std::path::Path;
use zonpin_core::Config;
use zonpin_hash::{hash_file_tree, package_hash};

pub fn run(dir: &Path, config: &Config, files: bool, json: bool) -> Result<u8, String> {
    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()));
    }

    let pb = (!json).then(|| spinner(&format!("hashing {}", dir.display())));
    let hashed = match hash_file_tree(dir, &config.hash_options()) {
        Ok(hashed) => hashed,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "hashing failed");
            }
            return Err(format!("hash error: {e}"));
        }
    };
    let hash = package_hash(&hashed);
    if let Some(pb) = &pb {
        spin_ok(pb, &format!("hashed {} files", hashed.len()));
    }

    if json {
        let mut payload = serde_json::json!({
            "path": dir,
            "hash": hash,
            "file_count": hashed.len(),
        });
        if files {
            payload["files"] = serde_json::to_value(&hashed)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
        }
        println!("{}", json_pretty(&payload)?);
    } else {
        if files {
            for file in &hashed {
                let exec = if file.executable { "x" } else { "-" };
                println!("{} {exec} {}", hex::encode(file.digest), file.path);
            }
        }
        println!("{hash}");
    }
    Ok(EXIT_SUCCESS)
}

