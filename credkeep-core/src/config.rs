//! Store configuration.
//!
//! Configuration is read from `credkeep.toml` in the platform configuration
//! directory (`~/.config/credkeep/` on Linux). Every field is optional:
//!
//! ```toml
//! engine = "file"               # memory | file | keyring
//! data_file = "/var/lib/credkeep/credentials.json"
//! keyring_service = "credkeep"
//! lock_granularity = "store_wide" # store_wide | per_key
//! log_level = "info"
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::{EngineError, FileEngine};
use crate::store::LockGranularity;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`Config`].
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration directory not available.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,
}

/// Which persistence engine backs the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Memory,
    #[default]
    File,
    Keyring,
}

/// credkeep configuration, read from a TOML file; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistence engine.
    pub engine: EngineKind,

    /// Data file for the file engine. Defaults to the platform data directory.
    pub data_file: Option<PathBuf>,

    /// Keyring service name for the keyring engine.
    pub keyring_service: String,

    /// Operation lock granularity.
    pub lock_granularity: LockGranularity,

    /// Logging level.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            data_file: None,
            keyring_service: "credkeep".to_string(),
            lock_granularity: LockGranularity::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs = project_dirs().ok_or(ConfigError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join("credkeep.toml"))
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path, or defaults if absent.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The data file the file engine should use.
    pub fn data_file(&self) -> Result<PathBuf, EngineError> {
        match &self.data_file {
            Some(path) => Ok(path.clone()),
            None => FileEngine::default_path(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "raibid-labs", "credkeep")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from_path(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credkeep.toml");
        fs::write(&path, "engine = \"memory\"\nlock_granularity = \"per_key\"\n").unwrap();

        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(config.engine, EngineKind::Memory);
        assert_eq!(config.lock_granularity, LockGranularity::PerKey);
        assert_eq!(config.keyring_service, "credkeep");
        assert_eq!(config.log_level, "info");
        assert!(config.data_file.is_none());
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("credkeep.toml");
        fs::write(&path, "engine = \"floppy\"\n").unwrap();

        let result = Config::load_from_path(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_explicit_data_file_wins() {
        let config = Config {
            data_file: Some(PathBuf::from("/tmp/creds.json")),
            ..Config::default()
        };
        assert_eq!(config.data_file().unwrap(), PathBuf::from("/tmp/creds.json"));
    }
}
