//! Backend process supervisor.
//!
//! Resolves how to launch the local backend (packaged binary or development
//! virtualenv), spawns it, and races a stderr marker against an HTTP health
//! probe to decide when it is ready. Startup failures are reported, never
//! fatal: the shell keeps running in a degraded state.

pub mod error;
pub mod launch;
pub mod process;
pub mod readiness;

pub use error::SupervisorError;
pub use launch::{DeploymentMode, LaunchLocations, LaunchPlan, DATA_DIR_ENV, PACKAGED_BINARY};
pub use process::BackendSupervisor;
pub use readiness::{HealthProbe, ReadinessConfig, ReadinessSignal};
