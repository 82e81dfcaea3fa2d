//! Recording lifecycle orchestrator.
//!
//! idle → recording → processing → idle (or error)
//!
//! User actions are serialized by an action lock so two clicks can never
//! interleave their backend calls. The poll loop runs on its own task and
//! only touches state through the generation check in [`super::poller`].

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use tracing::{info, warn};

use super::events::SessionEvent;
use super::poller::{PollContext, StatusPoller};
use super::state::{SessionPhase, SessionState, SessionStateHandle};
use crate::backend::{BackendApi, ClientError};
use crate::config::SessionConfig;
use crate::meeting::{start_request_for, MeetingSelection};

pub const TRANSCRIBING_STEP: &str = "Transcribing audio...";
pub const RETRYING_STEP: &str = "Retrying transcription...";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error("Failed to {action}: {source}")]
    Request {
        action: &'static str,
        #[source]
        source: ClientError,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct SessionTimings {
    pub poll_interval: Duration,
    pub completion_grace: Duration,
}

impl SessionTimings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.status_poll_interval_ms),
            completion_grace: Duration::from_millis(config.completion_grace_ms),
        }
    }
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[derive(Clone)]
pub struct RecordingSessionController {
    ctx: Arc<PollContext>,
    poller: Arc<StatusPoller>,
    actions: Arc<Mutex<()>>,
}

impl RecordingSessionController {
    pub fn new(
        api: Arc<dyn BackendApi>,
        events: UnboundedSender<SessionEvent>,
        timings: SessionTimings,
    ) -> Self {
        let ctx = PollContext {
            api,
            state: SessionStateHandle::default(),
            events,
            interval: timings.poll_interval,
            completion_grace: timings.completion_grace,
        };

        Self {
            ctx: Arc::new(ctx),
            poller: Arc::new(StatusPoller::default()),
            actions: Arc::new(Mutex::new(())),
        }
    }

    pub fn state(&self) -> &SessionStateHandle {
        &self.ctx.state
    }

    pub async fn snapshot(&self) -> SessionState {
        self.ctx.state.get().await
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// Replace the selection. Rejected once a recording has started.
    pub async fn attach_selection(&self, selection: MeetingSelection) -> Result<(), SessionError> {
        let _action = self.actions.lock().await;
        let mut state = self.ctx.state.lock().await;
        if !state.phase().accepts_selection() {
            return Err(SessionError::InvalidPhase {
                action: "change meeting",
                phase: state.phase(),
            });
        }
        info!("Selected meeting: {}", selection.title());
        state.attach(selection);
        Ok(())
    }

    /// Attach only when nothing is selected yet. Returns whether it attached.
    pub async fn attach_if_vacant(&self, selection: MeetingSelection) -> bool {
        let _action = self.actions.lock().await;
        let mut state = self.ctx.state.lock().await;
        if !state.phase().accepts_selection() || state.selected_meeting().is_some() {
            return false;
        }
        info!("Auto-selected meeting: {}", selection.title());
        state.attach(selection);
        true
    }

    pub async fn clear_selection(&self) -> Result<(), SessionError> {
        let _action = self.actions.lock().await;
        let mut state = self.ctx.state.lock().await;
        if !state.phase().accepts_selection() {
            return Err(SessionError::InvalidPhase {
                action: "clear meeting",
                phase: state.phase(),
            });
        }
        state.clear_selection();
        Ok(())
    }

    pub async fn start_recording(&self) -> Result<SessionPhase, SessionError> {
        let _action = self.actions.lock().await;
        let (phase, selection) = {
            let state = self.ctx.state.lock().await;
            (state.phase(), state.selected_meeting().cloned())
        };
        if !phase.can_start() {
            return Err(SessionError::InvalidPhase {
                action: "start recording",
                phase,
            });
        }

        let request = start_request_for(selection.as_ref());
        match self.ctx.api.start_recording(&request).await {
            Ok(()) => {
                self.ctx.state.lock().await.begin_recording(Utc::now());
                info!(
                    "Recording started ({})",
                    selection
                        .as_ref()
                        .map(MeetingSelection::title)
                        .unwrap_or("no meeting")
                );
                self.ctx.emit(SessionEvent::PhaseChanged(SessionPhase::Recording));
                Ok(SessionPhase::Recording)
            }
            Err(source) => Err(self.request_failed("start recording", source)),
        }
    }

    pub async fn stop_recording(&self) -> Result<SessionPhase, SessionError> {
        let _action = self.actions.lock().await;
        let phase = self.ctx.state.lock().await.phase();
        if phase != SessionPhase::Recording {
            return Err(SessionError::InvalidPhase {
                action: "stop recording",
                phase,
            });
        }

        match self.ctx.api.stop_recording().await {
            Ok(()) => {
                info!("Recording stopped, processing");
                self.enter_processing(TRANSCRIBING_STEP).await;
                Ok(SessionPhase::Processing)
            }
            Err(source) => Err(self.request_failed("stop recording", source)),
        }
    }

    /// Re-process a saved recording. Supersedes any poll loop in flight.
    pub async fn retry_saved(&self, id: &str) -> Result<SessionPhase, SessionError> {
        let _action = self.actions.lock().await;
        let phase = self.ctx.state.lock().await.phase();
        if phase == SessionPhase::Recording {
            return Err(SessionError::InvalidPhase {
                action: "retry a recording",
                phase,
            });
        }

        match self.ctx.api.retry_saved_recording(id).await {
            Ok(()) => {
                info!("Retrying saved recording {}", id);
                self.enter_processing(RETRYING_STEP).await;
                self.ctx.emit(SessionEvent::RefreshSaved);
                Ok(SessionPhase::Processing)
            }
            Err(source) => Err(self.request_failed("retry", source)),
        }
    }

    /// Start when idle, stop when recording; ignored while processing.
    pub async fn toggle(&self) -> Result<SessionPhase, SessionError> {
        let phase = self.ctx.state.get().await.phase();
        match phase {
            SessionPhase::Idle | SessionPhase::Error => self.start_recording().await,
            SessionPhase::Recording => self.stop_recording().await,
            SessionPhase::Processing => {
                warn!("Toggle ignored while processing");
                Ok(phase)
            }
        }
    }

    /// Stop polling. Used on shutdown.
    pub fn shutdown(&self) {
        self.poller.cancel();
    }

    async fn enter_processing(&self, step: &str) {
        let generation = self.ctx.state.lock().await.begin_processing(step);
        self.poller.restart(self.ctx.clone(), generation);
        self.ctx.emit(SessionEvent::PhaseChanged(SessionPhase::Processing));
        self.ctx.emit(SessionEvent::StepChanged(step.to_string()));
    }

    fn request_failed(&self, action: &'static str, source: ClientError) -> SessionError {
        let error = SessionError::Request { action, source };
        warn!("{}", error);
        self.ctx.emit(SessionEvent::Notice(error.to_string()));
        error
    }
}
