//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API base URL, endpoint paths, request timeout and the
//! last email used to log in.
//!
//! Configuration is stored at `~/.config/sessionkeep/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/data directory paths
const APP_NAME: &str = "sessionkeep";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub const ENV_API_URL: &str = "SESSIONKEEP_API_URL";
pub const ENV_EMAIL: &str = "SESSIONKEEP_EMAIL";
pub const ENV_PASSWORD: &str = "SESSIONKEEP_PASSWORD";
pub const ENV_TIMEOUT: &str = "SESSIONKEEP_TIMEOUT_SECS";

/// Paths of the remote authority's endpoints, relative to `api_base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoints {
    pub login: String,
    pub logout: String,
    pub register: String,
    pub current_user: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/v1/users/login".to_string(),
            logout: "/api/v1/users/logout".to_string(),
            register: "/api/v1/users/register".to_string(),
            current_user: "/api/v1/users/current-user".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            endpoints: Endpoints::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Record the last email used to log in. Only that field is written: the
    /// file is re-read so environment overrides applied to an in-memory
    /// config never end up on disk.
    pub fn remember_email(email: &str) -> Result<()> {
        Self::remember_email_at(&Self::config_path()?, email)
    }

    pub fn remember_email_at(path: &Path, email: &str) -> Result<()> {
        let mut on_disk = Self::load_from(path)?;
        let email = email.trim();
        if on_disk.last_email.as_deref() == Some(email) {
            return Ok(());
        }
        on_disk.last_email = Some(email.to_string());
        on_disk.save_to(path)
    }

    /// Apply environment overrides. `var` is the lookup function, normally
    /// `|k| std::env::var(k).ok()`.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(email) = var(ENV_EMAIL).filter(|e| !e.trim().is_empty()) {
            self.last_email = Some(email.trim().to_string());
        }
        if let Some(raw) = var(ENV_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid request timeout override"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding durable session storage and logs.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
