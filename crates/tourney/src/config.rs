//! Runtime configuration loaded from TOML

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_FILE: &str = "tourney.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourneyConfig {
    /// JSON snapshot holding the tournament
    pub data_file: PathBuf,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// Scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seed for first-meeting draws (None = entropy)
    pub seed: Option<u64>,
    /// Start newly created matches when their teams are free
    pub update_statuses: bool,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for TourneyConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("tournament.json"),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            update_statuses: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl TourneyConfig {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents, path)
    }

    /// Like [`TourneyConfig::load`], but a missing file gives the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = Path::new("tourney.toml");
        let config = TourneyConfig::from_toml("[scheduler]\nseed = 7\n", path).unwrap();
        assert_eq!(config.scheduler.seed, Some(7));
        assert!(config.scheduler.update_statuses);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.data_file, PathBuf::from("tournament.json"));
    }

    #[test]
    fn test_full_file() {
        let toml = r#"
            data_file = "cup.json"

            [scheduler]
            update_statuses = false

            [logging]
            filter = "tourney=debug"
        "#;
        let config = TourneyConfig::from_toml(toml, Path::new("x.toml")).unwrap();
        assert_eq!(config.data_file, PathBuf::from("cup.json"));
        assert_eq!(config.scheduler.seed, None);
        assert!(!config.scheduler.update_statuses);
        assert_eq!(config.logging.filter, "tourney=debug");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let result = TourneyConfig::from_toml("data_file = [", Path::new("bad.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("tourney-missing-config.toml");
        let config = TourneyConfig::load_or_default(&path).unwrap();
        assert_eq!(config, TourneyConfig::default());
    }
}
