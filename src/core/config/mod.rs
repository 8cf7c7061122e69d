//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Each pool carries one optional configuration file, `<pool>/config.toml`.
//! It records the commit author shown by `dvol log` and how dvol talks to
//! Docker.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Pool config file
//! 3. CLI flags (not handled here)
//!
//! # Keys
//!
//! `dvol config` addresses values by dotted key; see [`ConfigKey`].
//!
//! # Example
//!
//! ```no_run
//! use dvol::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("/var/lib/dvol/volumes")).unwrap();
//!
//! println!("Author: {} <{}>", config.user_name(), config.user_email());
//! println!("Docker integration: {}", config.docker_integration());
//! ```

pub mod schema;

pub use schema::{DockerConfig, PoolConfig, UserConfig};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use super::fsops::write_atomic;

/// Config file name inside the pool.
pub const CONFIG_FILE: &str = "config.toml";

/// Author name used when none is configured.
pub const DEFAULT_USER_NAME: &str = "Who knows";

/// Author email used when none is configured.
pub const DEFAULT_USER_EMAIL: &str = "mystery@person";

/// Volume driver name used when none is configured.
pub const DEFAULT_DRIVER: &str = "dvol";

/// Stop attempts per container used when none is configured.
pub const DEFAULT_STOP_RETRIES: u32 = 5;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("'{0}' is not a valid configuration key")]
    UnknownKey(String),
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    UserName,
    UserEmail,
    DockerIntegration,
    DockerStopRetries,
    DockerDriver,
}

impl ConfigKey {
    /// Every key, in display order.
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::UserName,
        ConfigKey::UserEmail,
        ConfigKey::DockerIntegration,
        ConfigKey::DockerStopRetries,
        ConfigKey::DockerDriver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::UserName => "user.name",
            ConfigKey::UserEmail => "user.email",
            ConfigKey::DockerIntegration => "docker.integration",
            ConfigKey::DockerStopRetries => "docker.stop_retries",
            ConfigKey::DockerDriver => "docker.driver",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loaded pool configuration.
///
/// Accessor methods apply defaults for anything the file leaves unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: PoolConfig,
    /// Path the config was loaded from (if the file existed)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration for the pool at `pool_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error (defaults are used).
    pub fn load(pool_root: &Path) -> Result<Config, ConfigError> {
        let path = Self::config_path(pool_root);
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;
        let file: PoolConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Config {
            file,
            loaded_from: Some(path),
        })
    }

    /// Canonical config path for a pool.
    pub fn config_path(pool_root: &Path) -> PathBuf {
        pool_root.join(CONFIG_FILE)
    }

    /// Write the config file for a pool atomically.
    ///
    /// Creates the pool directory if needed.
    pub fn write(pool_root: &Path, file: &PoolConfig) -> Result<PathBuf, ConfigError> {
        file.validate()?;
        let path = Self::config_path(pool_root);

        fs::create_dir_all(pool_root).map_err(|e| ConfigError::WriteError {
            path: path.clone(),
            source: e,
        })?;
        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        write_atomic(&path, contents.as_bytes()).map_err(|e| ConfigError::WriteError {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }

    /// Path of the file this config was read from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Commit author name. Defaults to "Who knows".
    pub fn user_name(&self) -> &str {
        self.file
            .user
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .unwrap_or(DEFAULT_USER_NAME)
    }

    /// Commit author email. Defaults to "mystery@person".
    pub fn user_email(&self) -> &str {
        self.file
            .user
            .as_ref()
            .and_then(|u| u.email.as_deref())
            .unwrap_or(DEFAULT_USER_EMAIL)
    }

    /// Whether containers are stopped around snapshot operations.
    ///
    /// Defaults to `true`.
    pub fn docker_integration(&self) -> bool {
        self.file
            .docker
            .as_ref()
            .and_then(|d| d.integration)
            .unwrap_or(true)
    }

    /// Stop attempts per container. Defaults to 5.
    pub fn stop_retries(&self) -> u32 {
        self.file
            .docker
            .as_ref()
            .and_then(|d| d.stop_retries)
            .unwrap_or(DEFAULT_STOP_RETRIES)
    }

    /// Volume driver name. Defaults to "dvol".
    pub fn driver(&self) -> &str {
        self.file
            .docker
            .as_ref()
            .and_then(|d| d.driver.as_deref())
            .unwrap_or(DEFAULT_DRIVER)
    }

    // =========================================================================
    // Keyed access
    // =========================================================================

    /// Effective value of a key, defaults applied.
    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::UserName => self.user_name().to_string(),
            ConfigKey::UserEmail => self.user_email().to_string(),
            ConfigKey::DockerIntegration => self.docker_integration().to_string(),
            ConfigKey::DockerStopRetries => self.stop_retries().to_string(),
            ConfigKey::DockerDriver => self.driver().to_string(),
        }
    }

    /// Set a key from its string form.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `value` does not parse for the
    /// key or fails validation. The config is unchanged on error.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let mut file = self.file.clone();
        match key {
            ConfigKey::UserName => {
                file.user.get_or_insert_with(Default::default).name = Some(value.to_string())
            }
            ConfigKey::UserEmail => {
                file.user.get_or_insert_with(Default::default).email = Some(value.to_string())
            }
            ConfigKey::DockerIntegration => {
                let parsed = value.parse::<bool>().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "{} must be 'true' or 'false', got '{}'",
                        key, value
                    ))
                })?;
                file.docker.get_or_insert_with(Default::default).integration = Some(parsed);
            }
            ConfigKey::DockerStopRetries => {
                let parsed = value.parse::<u32>().map_err(|_| {
                    ConfigError::InvalidValue(format!(
                        "{} must be a positive integer, got '{}'",
                        key, value
                    ))
                })?;
                file.docker.get_or_insert_with(Default::default).stop_retries = Some(parsed);
            }
            ConfigKey::DockerDriver => {
                file.docker.get_or_insert_with(Default::default).driver = Some(value.to_string())
            }
        }

        file.validate()?;
        self.file = file;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();

        assert!(config.loaded_from().is_none());
        assert_eq!(config.user_name(), DEFAULT_USER_NAME);
        assert_eq!(config.user_email(), DEFAULT_USER_EMAIL);
        assert!(config.docker_integration());
        assert_eq!(config.stop_retries(), DEFAULT_STOP_RETRIES);
        assert_eq!(config.driver(), DEFAULT_DRIVER);
    }

    #[test]
    fn load_file_values() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            r#"
            [user]
            name = "Ada"

            [docker]
            integration = false
            "#,
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.user_name(), "Ada");
        assert_eq!(config.user_email(), DEFAULT_USER_EMAIL);
        assert!(!config.docker_integration());
        assert_eq!(config.loaded_from(), Some(temp.path().join(CONFIG_FILE).as_path()));
    }

    #[test]
    fn load_invalid_toml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "[docker\n").unwrap();

        let err = Config::load(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn write_then_load() {
        let temp = TempDir::new().unwrap();
        let pool = temp.path().join("pool");

        let mut config = Config::default();
        config.set(ConfigKey::UserEmail, "ada@example.com").unwrap();
        config.set(ConfigKey::DockerStopRetries, "2").unwrap();
        Config::write(&pool, &config.file).unwrap();

        let loaded = Config::load(&pool).unwrap();
        assert_eq!(loaded.user_email(), "ada@example.com");
        assert_eq!(loaded.stop_retries(), 2);
        assert!(!pool.join("config.toml.tmp").exists());
    }

    #[test]
    fn key_parsing() {
        assert_eq!("user.name".parse::<ConfigKey>().unwrap(), ConfigKey::UserName);
        assert_eq!(
            "docker.driver".parse::<ConfigKey>().unwrap(),
            ConfigKey::DockerDriver
        );

        let err = "user.colour".parse::<ConfigKey>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "'user.colour' is not a valid configuration key"
        );
    }

    #[test]
    fn set_rejects_bad_values_without_change() {
        let mut config = Config::default();
        assert!(config.set(ConfigKey::DockerIntegration, "maybe").is_err());
        assert!(config.set(ConfigKey::DockerStopRetries, "0").is_err());
        assert!(config.set(ConfigKey::DockerStopRetries, "-1").is_err());
        assert_eq!(config.file, PoolConfig::default());
    }

    #[test]
    fn get_reports_effective_values() {
        let mut config = Config::default();
        assert_eq!(config.get(ConfigKey::DockerIntegration), "true");
        config.set(ConfigKey::DockerIntegration, "false").unwrap();
        assert_eq!(config.get(ConfigKey::DockerIntegration), "false");
    }
}
