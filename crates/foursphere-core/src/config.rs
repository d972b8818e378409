//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API credentials, query defaults, timeouts and an optional home position.
//!
//! Configuration is stored at `~/.config/foursphere/config.json`.
//! `FOURSQUARE_CLIENT_ID` / `FOURSQUARE_CLIENT_SECRET` override stored
//! credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::api::ClientSettings;
use crate::models::Coordinate;
use crate::pipeline::orchestrator::{DEFAULT_LOCATION_TIMEOUT_SECS, DEFAULT_QUERY};
use crate::pipeline::PipelineSettings;

/// Application name used for config/data directory paths
const APP_NAME: &str = "foursphere";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// SQLite file holding cached venues
const DATABASE_FILE: &str = "venues.db";

const CLIENT_ID_ENV: &str = "FOURSQUARE_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "FOURSQUARE_CLIENT_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_version: String,
    pub api_base_url: String,
    pub query: String,
    pub location_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub home: Option<Coordinate>,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            query: DEFAULT_QUERY.to_string(),
            location_timeout_secs: DEFAULT_LOCATION_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            home: None,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Load the stored config (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_stored()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The config file as written, without environment overrides. Only this
    /// form may be passed to `save`; env credentials stay off disk.
    pub fn load_stored() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Environment credentials win over stored ones; empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(CLIENT_ID_ENV).filter(|v| !v.is_empty()) {
            self.client_id = Some(id);
        }
        if let Some(secret) = lookup(CLIENT_SECRET_ENV).filter(|v| !v.is_empty()) {
            self.client_secret = Some(secret);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the venue database and log files.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DATABASE_FILE))
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("logs"))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            api_version: self.api_version.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            query: self.query.clone(),
            location_timeout: Duration::from_secs(self.location_timeout_secs),
        }
    }
}
