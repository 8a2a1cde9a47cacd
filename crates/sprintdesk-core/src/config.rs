//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, the last used username and whether the
//! password should be remembered in the OS keychain.
//!
//! Configuration is stored at `~/.config/sprintdesk/config.json`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Keychain;

/// Application name used for config/data directory paths
const APP_NAME: &str = "sprintdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when neither the environment nor the config names one
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment overrides
pub const API_URL_ENV: &str = "SPRINTDESK_API_URL";
pub const USERNAME_ENV: &str = "SPRINTDESK_USERNAME";
pub const PASSWORD_ENV: &str = "SPRINTDESK_PASSWORD";

/// Config shared between the front end and the screens
pub type SharedConfig = Arc<Mutex<Config>>;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_username: Option<String>,
    #[serde(default)]
    pub remember_password: bool,
    /// Backing file; `None` means the config is never written.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            debug!("Config has no backing file, not saving");
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn into_shared(self) -> SharedConfig {
        Arc::new(Mutex::new(self))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Per-user data directory holding the credential file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }

    /// Environment first, then config, then the local default
    pub fn api_base_url(&self) -> String {
        resolve_base_url(std::env::var(API_URL_ENV).ok(), self.api_base_url.as_deref())
    }

    /// Username to prefill the login form with
    pub fn prefill_username(&self) -> String {
        std::env::var(USERNAME_ENV)
            .ok()
            .or_else(|| self.last_username.clone())
            .unwrap_or_default()
    }

    /// Password to prefill the login form with, if any is available
    pub fn prefill_password(&self, username: &str) -> String {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            return password;
        }
        if self.remember_password && !username.is_empty() {
            match Keychain::get_password(username) {
                Ok(Some(password)) => return password,
                Ok(None) => debug!("No remembered password for this user"),
                Err(e) => warn!(error = %e, "Could not read remembered password"),
            }
        }
        String::new()
    }
}

fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_precedence() {
        assert_eq!(resolve_base_url(None, None), DEFAULT_API_URL);
        assert_eq!(resolve_base_url(None, Some("http://cfg")), "http://cfg");
        assert_eq!(
            resolve_base_url(Some("http://env".into()), Some("http://cfg")),
            "http://env"
        );
        assert_eq!(resolve_base_url(Some("  ".into()), Some("http://cfg")), "http://cfg");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::load_from(&path).expect("missing file loads defaults");
        assert!(config.last_username.is_none());
        config.last_username = Some("ada".to_string());
        config.remember_password = true;
        config.save().expect("save");

        let reloaded = Config::load_from(&path).expect("reload");
        assert_eq!(reloaded.last_username.as_deref(), Some("ada"));
        assert!(reloaded.remember_password);
    }

    #[test]
    fn test_default_config_is_never_written() {
        assert!(Config::default().save().is_ok());
    }

    #[test]
    fn test_corrupt_config_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not json").expect("write");
        assert!(Config::load_from(&path).is_err());
    }
}
