use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::FileStore;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid {file}: {source}")]
    Parse {
        file: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Data directory not found")]
    DataDirNotFound,
}

/// Engine settings that do not belong in the synced store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
    /// Subdirectory of the WebDAV base URL holding the sync files
    pub remote_dir: String,
    pub debounce_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            remote_dir: "EXThighlight_words".to_string(),
            debounce_secs: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    /// Load `config.toml` from `data_dir`. A missing file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, data_dir.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { file: path, source })
    }

    /// Resolve the data directory: explicit override, then `data_dir` from
    /// the default location's config file, then the platform default.
    pub fn resolve(data_dir: Option<PathBuf>) -> Result<(PathBuf, Self), ConfigError> {
        if let Some(dir) = data_dir {
            let config = Self::load(&dir)?;
            return Ok((dir, config));
        }

        let default_dir = FileStore::default_data_dir().map_err(|_| ConfigError::DataDirNotFound)?;
        let config = Self::load(&default_dir)?;
        let dir = config.data_dir.clone().unwrap_or(default_dir);
        Ok((dir, config))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::load(temp.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.remote_dir, "EXThighlight_words");
        assert_eq!(config.debounce(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "remote_dir = \"words\"\ndebounce_secs = 2\n",
        )
        .unwrap();

        let config = EngineConfig::load(temp.path()).unwrap();
        assert_eq!(config.remote_dir, "words");
        assert_eq!(config.debounce_secs, 2);
        assert_eq!(config.connect_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_file_names_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "debounce_secs = \"soon\"").unwrap();

        let err = EngineConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let temp = TempDir::new().unwrap();
        let (dir, config) = EngineConfig::resolve(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(dir, temp.path());
        assert_eq!(config.remote_dir, "EXThighlight_words");
    }
}
