use crate::concurrency::ManifestLock;
use crate::config::Config;
use crate::CoreError;
use std::path::Path;
use tracing::debug;
use zonpin_schema::{parse_manifest_str, write_manifest_file, ManifestError};

/// Rewrite a manifest in canonical form. Returns whether the text changed.
///
/// With `check` set the file is only compared, never written. Otherwise the
/// manifest lock is held from the read through the write.
pub fn format_manifest(path: &Path, config: &Config, check: bool) -> Result<bool, CoreError> {
    let _lock = if check {
        None
    } else {
        Some(ManifestLock::acquire(path)?)
    };
    let text = std::fs::read_to_string(path).map_err(ManifestError::from)?;
    let manifest = parse_manifest_str(&text)?;
    let canonical = manifest.render_with_indent(config.indent_unit());
    let changed = canonical != text;
    if changed && !check {
        write_manifest_file(path, &canonical)?;
        debug!("formatted {}", path.display());
    }
    Ok(changed)
}
