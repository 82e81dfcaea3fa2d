use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why the backend could not be brought up. None of these are fatal to the
/// shell; the UI runs degraded and start may be retried.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to start backend {executable:?}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backend startup timeout ({}s)", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Backend exited before it became ready (code {code:?})")]
    ExitedEarly { code: Option<i32> },

    #[error("Backend is already running (pid {0})")]
    AlreadyRunning(u32),
}
