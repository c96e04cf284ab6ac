use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fs::FileSystem;

pub const DEFAULT_BRANCH: &str = "master";

/// Per-repository settings read from `.pgit/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Branch created by `init` and attached to HEAD.
    pub default_branch: String,
    /// Extra entry names never written into trees or swept on checkout.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl Config {
    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Loads the config at `path`; a missing file yields the defaults.
    pub fn load<F: FileSystem>(fs: &F, path: &Path) -> Result<Self> {
        if !fs.exists(path) {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs.read_file(path).map_err(|e| Error::io(path, e))?;
        let text = String::from_utf8_lossy(&raw);
        Ok(toml::from_str(&text)?)
    }

    pub fn save<F: FileSystem>(&self, fs: &F, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)?;
        fs.write_file(path, text.as_bytes())
            .map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn test_missing_config_uses_defaults() {
        let fs = MemoryFs::new();
        let config = Config::load(&fs, Path::new("/repo/.pgit/config.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.default_branch, "master");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let fs = MemoryFs::new();
        let path = Path::new("/repo/.pgit/config.toml");
        fs.write_file(path, b"exclude = [\"target\", \"node_modules\"]\n")
            .unwrap();

        let config = Config::load(&fs, path).unwrap();
        assert_eq!(config.default_branch, "master");
        assert_eq!(config.exclude, vec!["target", "node_modules"]);
    }

    #[test]
    fn test_save_then_load() {
        let fs = MemoryFs::new();
        let path = Path::new("/repo/.pgit/config.toml");
        let config = Config {
            default_branch: "main".into(),
            exclude: vec!["build".into()],
        };

        config.save(&fs, path).unwrap();
        assert_eq!(Config::load(&fs, path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let fs = MemoryFs::new();
        let path = Path::new("/repo/.pgit/config.toml");
        fs.write_file(path, b"default_branch = [").unwrap();

        assert!(matches!(Config::load(&fs, path), Err(Error::Config(_))));
    }
}
