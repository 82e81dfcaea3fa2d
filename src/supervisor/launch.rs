//! Decides how the backend is launched: a packaged binary shipped with the
//! app, or the development virtualenv next to the backend sources.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::BackendConfig;
use crate::global;

/// File name of the bundled backend under `<resources>/backend/`.
pub const PACKAGED_BINARY: &str = "meeting-note-taker-backend";

/// Tells the packaged backend where it may write its files.
pub const DATA_DIR_ENV: &str = "BACKEND_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Packaged,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMode::Development => "development",
            DeploymentMode::Packaged => "packaged",
        }
    }
}

/// Filesystem locations the launch plan is resolved against.
#[derive(Debug, Clone)]
pub struct LaunchLocations {
    pub resource_dir: Option<PathBuf>,
    pub backend_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl LaunchLocations {
    /// Config overrides first, platform defaults otherwise.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let resource_dir = match &config.resource_dir {
            Some(dir) => Some(dir.clone()),
            None => global::resource_dir().ok(),
        };
        let backend_dir = match &config.backend_dir {
            Some(dir) => dir.clone(),
            None => global::backend_project_dir()?,
        };
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => global::backend_data_dir()?,
        };

        Ok(Self {
            resource_dir,
            backend_dir,
            data_dir,
        })
    }

    pub fn packaged_binary(&self) -> Option<PathBuf> {
        self.resource_dir
            .as_ref()
            .map(|dir| dir.join("backend").join(PACKAGED_BINARY))
    }
}

/// Everything needed to spawn the backend once.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub mode: DeploymentMode,
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Merged over the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl LaunchPlan {
    pub fn resolve(locations: &LaunchLocations, host: &str, port: u16) -> Result<Self> {
        let plan = match locations.packaged_binary().filter(|p| p.exists()) {
            Some(binary) => Self::packaged(binary, &locations.data_dir)?,
            None => Self::development(&locations.backend_dir, host, port),
        };

        info!(
            "Backend launch mode: {} ({:?} in {:?})",
            plan.mode.as_str(),
            plan.executable,
            plan.working_dir
        );
        Ok(plan)
    }

    fn packaged(binary: PathBuf, data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create backend data dir {:?}", data_dir))?;

        let mut env = BTreeMap::new();
        env.insert(DATA_DIR_ENV.to_string(), data_dir.display().to_string());

        Ok(Self {
            mode: DeploymentMode::Packaged,
            executable: binary,
            args: Vec::new(),
            working_dir: data_dir.to_path_buf(),
            env,
        })
    }

    fn development(backend_dir: &Path, host: &str, port: u16) -> Self {
        Self {
            mode: DeploymentMode::Development,
            executable: venv_python(backend_dir),
            args: vec![
                "-m".to_string(),
                "uvicorn".to_string(),
                "main:app".to_string(),
                "--host".to_string(),
                host.to_string(),
                "--port".to_string(),
                port.to_string(),
            ],
            working_dir: backend_dir.to_path_buf(),
            env: BTreeMap::new(),
        }
    }
}

fn venv_python(backend_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        backend_dir.join("venv").join("Scripts").join("python.exe")
    } else {
        backend_dir.join("venv").join("bin").join("python")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations(root: &Path) -> LaunchLocations {
        LaunchLocations {
            resource_dir: Some(root.join("resources")),
            backend_dir: root.join("backend"),
            data_dir: root.join("data").join("backend-data"),
        }
    }

    #[test]
    fn test_packaged_mode_when_binary_exists() {
        let td = tempfile::tempdir().expect("tempdir");
        let locations = locations(td.path());
        let binary = locations.packaged_binary().unwrap();
        std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
        std::fs::write(&binary, b"bin").unwrap();

        for _ in 0..3 {
            let plan = LaunchPlan::resolve(&locations, "127.0.0.1", 8000).unwrap();
            assert_eq!(plan.mode, DeploymentMode::Packaged);
            assert_eq!(plan.executable, binary);
            assert!(plan.args.is_empty());
            assert_eq!(plan.working_dir, locations.data_dir);
        }

        assert!(locations.data_dir.is_dir(), "data dir is created");
        let plan = LaunchPlan::resolve(&locations, "127.0.0.1", 8000).unwrap();
        assert_eq!(
            plan.env.get(DATA_DIR_ENV).map(String::as_str),
            Some(locations.data_dir.display().to_string().as_str())
        );
    }

    #[test]
    fn test_development_mode_when_binary_missing() {
        let td = tempfile::tempdir().expect("tempdir");
        let locations = locations(td.path());

        for _ in 0..3 {
            let plan = LaunchPlan::resolve(&locations, "127.0.0.1", 8000).unwrap();
            assert_eq!(plan.mode, DeploymentMode::Development);
            assert_eq!(plan.executable, venv_python(&locations.backend_dir));
            assert_eq!(
                plan.args,
                ["-m", "uvicorn", "main:app", "--host", "127.0.0.1", "--port", "8000"]
            );
            assert_eq!(plan.working_dir, locations.backend_dir);
            assert!(plan.env.is_empty());
        }

        assert!(!locations.data_dir.exists(), "dev mode leaves data dir alone");
    }

    #[test]
    fn test_development_mode_without_resource_dir() {
        let td = tempfile::tempdir().expect("tempdir");
        let mut locations = locations(td.path());
        locations.resource_dir = None;

        let plan = LaunchPlan::resolve(&locations, "0.0.0.0", 9001).unwrap();
        assert_eq!(plan.mode, DeploymentMode::Development);
        assert_eq!(plan.args.last().map(String::as_str), Some("9001"));
    }
}
