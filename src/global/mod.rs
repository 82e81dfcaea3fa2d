use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "notetaker";

/// Environment override for the config file location.
pub const CONFIG_ENV: &str = "NOTETAKER_CONFIG";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Unable to determine config directory")
}

pub fn config_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(config_dir()?.join("config.toml"))
}

pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = dirs::data_dir() {
        return Ok(dir.join(APP_DIR));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".local").join("share").join(APP_DIR));
    }
    Err(anyhow!("Unable to determine data directory"))
}

/// Writable directory handed to the packaged backend.
pub fn backend_data_dir() -> Result<PathBuf> {
    Ok(data_dir()?.join("backend-data"))
}

/// Bundled resources live next to the shell executable.
pub fn resource_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Unable to locate current executable")?;
    exe.parent()
        .map(|dir| dir.join("resources"))
        .ok_or_else(|| anyhow!("Executable has no parent directory: {:?}", exe))
}

/// Backend project checkout used in development mode.
pub fn backend_project_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()
        .context("Unable to determine working directory")?
        .join("backend"))
}
