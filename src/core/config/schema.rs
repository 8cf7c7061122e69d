//! core::config::schema
//!
//! Configuration schema types.
//!
//! The pool configuration lives at `<pool>/config.toml`. Every field is
//! optional; accessors on [`Config`](super::Config) supply the defaults.
//!
//! # Validation
//!
//! Values are validated after parsing (e.g. `stop_retries` must be at
//! least 1, `driver` must be non-empty).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of `config.toml`.
///
/// # Example
///
/// ```toml
/// [user]
/// name = "Ada"
/// email = "ada@example.com"
///
/// [docker]
/// integration = true
/// stop_retries = 5
/// driver = "dvol"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Commit author shown by `dvol log`
    pub user: Option<UserConfig>,

    /// Container runtime coordination
    pub docker: Option<DockerConfig>,
}

impl PoolConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(docker) = &self.docker {
            docker.validate()?;
        }
        Ok(())
    }
}

/// Author identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct UserConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Docker integration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DockerConfig {
    /// Stop and restart containers around snapshot operations
    pub integration: Option<bool>,

    /// Attempts per container stop before giving up on it
    pub stop_retries: Option<u32>,

    /// Volume driver name containers mount dvol volumes with
    pub driver: Option<String>,
}

impl DockerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_retries == Some(0) {
            return Err(ConfigError::InvalidValue(
                "docker.stop_retries must be at least 1".to_string(),
            ));
        }
        if let Some(driver) = &self.driver {
            if driver.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "docker.driver cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full() {
        let config: PoolConfig = toml::from_str(
            r#"
            [user]
            name = "Ada"
            email = "ada@example.com"

            [docker]
            integration = false
            stop_retries = 3
            driver = "custom"
            "#,
        )
        .unwrap();

        let user = config.user.as_ref().unwrap();
        assert_eq!(user.name.as_deref(), Some("Ada"));
        let docker = config.docker.as_ref().unwrap();
        assert_eq!(docker.integration, Some(false));
        assert_eq!(docker.stop_retries, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_empty() {
        let config: PoolConfig = toml::from_str("").unwrap();
        assert_eq!(config, PoolConfig::default());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result: Result<PoolConfig, _> = toml::from_str("colour = true");
        assert!(result.is_err());

        let result: Result<PoolConfig, _> = toml::from_str("[docker]\nsocket = \"/x\"");
        assert!(result.is_err());
    }

    #[test]
    fn zero_retries_invalid() {
        let config = PoolConfig {
            docker: Some(DockerConfig {
                stop_retries: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn empty_driver_invalid() {
        let docker = DockerConfig {
            driver: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(docker.validate().is_err());
    }
}
