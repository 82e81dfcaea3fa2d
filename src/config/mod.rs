use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub host: String,
    pub port: u16,
    pub health_path: String,
    /// Substring the backend writes to stderr once it can serve requests.
    pub readiness_marker: String,
    pub startup_timeout_ms: u64,
    /// Delay before the first health probe, so the socket has time to bind.
    pub probe_delay_ms: u64,
    pub probe_interval_ms: u64,
    /// Upper bound for any single request made by the backend client.
    pub request_timeout_secs: u64,
    pub resource_dir: Option<PathBuf>,
    pub backend_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub status_poll_interval_ms: u64,
    /// Wait after a completed session before auto-selecting the next meeting.
    pub completion_grace_ms: u64,
    pub auto_select_interval_secs: u64,
    pub notes_refresh_interval_secs: u64,
    pub saved_refresh_interval_secs: u64,
    pub reconnect_interval_secs: u64,
    pub picker_limit: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            health_path: "/api/health".to_string(),
            readiness_marker: "Application startup complete".to_string(),
            startup_timeout_ms: 15_000,
            probe_delay_ms: 1_000,
            probe_interval_ms: 500,
            request_timeout_secs: 30,
            resource_dir: None,
            backend_dir: None,
            data_dir: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            status_poll_interval_ms: 2_000,
            completion_grace_ms: 3_000,
            auto_select_interval_secs: 60,
            notes_refresh_interval_secs: 30,
            saved_refresh_interval_secs: 30,
            reconnect_interval_secs: 3,
            picker_limit: 10,
        }
    }
}

impl BackendConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.health_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
