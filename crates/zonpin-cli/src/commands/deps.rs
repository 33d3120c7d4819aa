use super::{json_pretty, EXIT_SUCCESS};
use std::path::Path;
use zonpin_schema::parse_manifest_file;

pub fn run(manifest: &Path, json: bool) -> Result<u8, String> {
    let parsed = parse_manifest_file(manifest).map_err(|e| format!("manifest error: {e}"))?;
    let deps = parsed
        .dependencies()
        .map_err(|e| format!("manifest error: {e}"))?;

    if json {
        println!("{}", json_pretty(&deps)?);
        return Ok(EXIT_SUCCESS);
    }

    if deps.is_empty() {
        println!("no dependencies");
    }
    for dep in &deps {
        println!("{}", dep.name);
        println!("  url:  {}", dep.url.as_deref().unwrap_or("-"));
        println!("  hash: {}", dep.hash.as_deref().unwrap_or("-"));
    }
    Ok(EXIT_SUCCESS)
}
