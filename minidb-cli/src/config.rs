//! Minimal on-disk configuration: where table files live, and the default
//! logging filter when `RUST_LOG` is not set.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub default_log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            default_log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads `minidb.toml` from `path` if it exists; falls back to defaults
    /// otherwise. A present-but-malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        toml::from_str(&text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/minidb.toml")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minidb.toml");
        std::fs::write(&path, "data_dir = \"/tmp/tables\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tables"));
        assert_eq!(config.default_log_filter, "info");
    }
}
