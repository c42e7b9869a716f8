use anyhow::{Context, Result};
use dirs::home_dir;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::Credentials;

/// Credentials stored in ~/.netatmo.yml.
///
/// Only application credentials are persisted, never tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Validate the stored fields into client credentials.
    pub fn credentials(&self) -> crate::error::Result<Credentials> {
        let credentials = Credentials::new(
            self.client_id.clone(),
            self.client_secret.clone(),
            self.username.clone(),
            self.password.clone(),
        )?;
        Ok(match &self.scope {
            Some(scope) => credentials.with_scope(scope.clone()),
            None => credentials,
        })
    }
}

/// Get the path to the configuration file (~/.netatmo.yml)
pub fn get_config_path() -> Result<PathBuf> {
    let home = home_dir().context("Failed to determine home directory")?;
    Ok(home.join(".netatmo.yml"))
}

/// Load configuration from ~/.netatmo.yml
pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {}",
            path.display()
        ));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    debug!("Loaded configuration for user: {}", config.username);
    Ok(config)
}

/// Save configuration to ~/.netatmo.yml
pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let content = serde_yaml::to_string(config).context("Failed to serialize configuration")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    debug!("Saved configuration for user: {}", config.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            client_id: "id123".to_string(),
            client_secret: "secret456".to_string(),
            username: "test@example.com".to_string(),
            password: "password123".to_string(),
            scope: None,
            base_url: None,
        }
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = sample_config();

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("client_id: id123"));
        assert!(yaml.contains("username: test@example.com"));
        assert!(!yaml.contains("scope"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.client_id, config.client_id);
        assert_eq!(parsed.password, config.password);
        assert!(parsed.base_url.is_none());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".netatmo.yml");

        let config = sample_config();
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.username, "test@example.com");
        assert_eq!(loaded.client_secret, "secret456");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.yml");
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_config_to_credentials() {
        let config = sample_config();
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.client_id, "id123");
        assert_eq!(credentials.scope, crate::types::DEFAULT_SCOPE);

        let mut config = sample_config();
        config.scope = Some("read_station".to_string());
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.scope, "read_station");
    }

    #[test]
    fn test_config_with_missing_field_fails_validation() {
        let mut config = sample_config();
        config.client_id = String::new();
        assert!(config.credentials().is_err());
    }
}
