use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zonpin_hash::HashOptions;
use zonpin_schema::DEFAULT_INDENT;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "ZONPIN_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Files hashed concurrently; defaults to the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Indent unit used when rewriting manifests.
    #[serde(default)]
    pub indent: Option<String>,
}

impl Config {
    /// Load `$ZONPIN_CONFIG`, else `~/.config/zonpin/config.json`.
    ///
    /// A missing default file yields the default config; a missing file named
    /// by `$ZONPIN_CONFIG` is an error.
    pub fn load_default() -> Result<Self, CoreError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CoreError::Config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.workers == Some(0) {
            return Err(CoreError::Config("workers must be at least 1".to_owned()));
        }
        if let Some(indent) = &self.indent {
            if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
                return Err(CoreError::Config(
                    "indent must be a non-empty run of spaces or tabs".to_owned(),
                ));
            }
        }
        Ok(())
    }

    pub fn indent_unit(&self) -> &str {
        self.indent.as_deref().unwrap_or(DEFAULT_INDENT)
    }

    pub fn hash_options(&self) -> HashOptions {
        let options = HashOptions::default();
        match self.workers {
            Some(n) => options.with_workers(n),
            None => options,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/zonpin/config.json"))
}
