//! Backend process lifecycle: spawn, readiness race, and shutdown.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::error::SupervisorError;
use super::launch::LaunchPlan;
use super::readiness::{HealthProbe, ReadinessConfig, ReadinessSignal};

/// Handle to the live child. Only the supervisor holds one.
struct RunningBackend {
    pid: u32,
    stop_tx: oneshot::Sender<()>,
}

impl RunningBackend {
    fn terminate(self) {
        #[cfg(unix)]
        {
            // SAFETY: plain kill(2) on a pid we spawned; no memory is touched.
            let rc = unsafe { libc::kill(self.pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                warn!(
                    "Failed to send SIGTERM to backend (pid {}): {}",
                    self.pid,
                    std::io::Error::last_os_error()
                );
            }
            drop(self.stop_tx);
        }
        #[cfg(not(unix))]
        {
            let _ = self.stop_tx.send(());
        }
    }
}

pub struct BackendSupervisor {
    plan: LaunchPlan,
    readiness: ReadinessConfig,
    running: Arc<Mutex<Option<RunningBackend>>>,
}

impl BackendSupervisor {
    pub fn new(plan: LaunchPlan, readiness: ReadinessConfig) -> Self {
        Self {
            plan,
            readiness,
            running: Arc::new(Mutex::new(None)),
        }
    }

    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    pub fn is_running(&self) -> bool {
        lock(&self.running).is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        lock(&self.running).as_ref().map(|r| r.pid)
    }

    /// Spawn the backend and wait until it is ready to serve requests.
    ///
    /// Resolves with whichever readiness signal fires first: the marker line
    /// on stderr or a 200 from the health endpoint. Fails on spawn error,
    /// early exit, or when neither signal arrives before the startup deadline.
    pub async fn start(&self) -> Result<ReadinessSignal, SupervisorError> {
        if let Some(pid) = self.pid() {
            return Err(SupervisorError::AlreadyRunning(pid));
        }

        info!(
            "Starting backend: {:?} {:?} (cwd {:?})",
            self.plan.executable, self.plan.args, self.plan.working_dir
        );

        let mut child = Command::new(&self.plan.executable)
            .args(&self.plan.args)
            .current_dir(&self.plan.working_dir)
            .envs(&self.plan.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                executable: self.plan.executable.clone(),
                source,
            })?;

        let pid = child.id().unwrap_or_default();
        let (marker_tx, mut marker_rx) = mpsc::channel::<ReadinessSignal>(1);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output(stdout, "stdout", None));
        }
        if let Some(stderr) = child.stderr.take() {
            let scan = Some((self.readiness.clone(), marker_tx));
            tokio::spawn(forward_output(stderr, "stderr", scan));
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (exit_tx, mut exit_rx) = oneshot::channel();
        *lock(&self.running) = Some(RunningBackend { pid, stop_tx });
        tokio::spawn(monitor(child, pid, stop_rx, exit_tx, self.running.clone()));

        let probe = HealthProbe::new(&self.readiness.health_url, self.readiness.probe_interval);
        let deadline = sleep(self.readiness.startup_timeout);

        let outcome = tokio::select! {
            Some(signal) = marker_rx.recv() => Ok(signal),
            _ = probe.wait_until_healthy(self.readiness.probe_delay) => Ok(ReadinessSignal::HealthProbe),
            Ok(status) = &mut exit_rx => Err(SupervisorError::ExitedEarly { code: status.code() }),
            _ = deadline => Err(SupervisorError::Timeout(self.readiness.startup_timeout)),
        };

        match &outcome {
            Ok(signal) => info!("Backend ready (pid {}, via {})", pid, signal.as_str()),
            Err(SupervisorError::Timeout(_)) => {
                error!("Backend did not become ready in time, stopping it");
                self.stop();
            }
            Err(e) => error!("Backend failed to start: {}", e),
        }

        outcome
    }

    /// Ask the backend to shut down and forget it. Safe to call repeatedly.
    pub fn stop(&self) {
        let Some(running) = lock(&self.running).take() else {
            debug!("Backend stop requested but no process is running");
            return;
        };

        info!("Stopping backend (pid {})", running.pid);
        running.terminate();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Copy a child stream to the log line by line, optionally watching for the
/// readiness marker. Bytes that are not UTF-8 are decoded lossily so the pipe
/// keeps draining.
async fn forward_output<R>(
    stream: R,
    name: &'static str,
    scan: Option<(ReadinessConfig, mpsc::Sender<ReadinessSignal>)>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                info!(target: "backend", "[{}] {}", name, line);
                if let Some((readiness, tx)) = &scan {
                    if readiness.is_marker(line) {
                        let _ = tx.try_send(ReadinessSignal::LogMarker);
                    }
                }
            }
            Err(e) => {
                warn!("Failed to read backend {}: {}", name, e);
                break;
            }
        }
    }
}

/// Owns the child until it exits, then clears the supervisor's handle.
async fn monitor(
    mut child: Child,
    pid: u32,
    stop_rx: oneshot::Receiver<()>,
    exit_tx: oneshot::Sender<ExitStatus>,
    running: Arc<Mutex<Option<RunningBackend>>>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = stop_rx => {
            let _ = child.start_kill();
            child.wait().await
        }
    };

    // Release the handle before reporting, so a caller reacting to the exit
    // can start again.
    {
        let mut guard = lock(&running);
        if guard.as_ref().is_some_and(|r| r.pid == pid) {
            *guard = None;
        }
    }

    match status {
        Ok(status) => {
            match status.code() {
                Some(0) | None => info!("Backend (pid {}) exited: {}", pid, status),
                Some(code) => error!("Backend (pid {}) exited with code {}", pid, code),
            }
            let _ = exit_tx.send(status);
        }
        Err(e) => error!("Failed to wait on backend (pid {}): {}", pid, e),
    }
}
