//! Status poll loop for the processing phase.
//!
//! At most one loop is live at a time. Starting a new one cancels the old
//! token, and every tick re-checks the generation under the state lock, so a
//! superseded loop can never write to the session.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::SessionEvent;
use super::state::{SessionPhase, SessionStateHandle};
use super::status::{classify, PollOutcome};
use crate::backend::{BackendApi, RecordingStatus};

/// Everything a poll loop needs, shared with the controller.
pub(crate) struct PollContext {
    pub api: Arc<dyn BackendApi>,
    pub state: SessionStateHandle,
    pub events: UnboundedSender<SessionEvent>,
    pub interval: Duration,
    pub completion_grace: Duration,
}

impl PollContext {
    pub fn emit(&self, event: SessionEvent) {
        // Receiver gone means the shell is shutting down.
        let _ = self.events.send(event);
    }

    async fn apply(&self, generation: u64, status: RecordingStatus) -> ControlFlow<()> {
        let mut state = self.state.lock().await;
        if state.poll_generation() != generation || state.phase() != SessionPhase::Processing {
            debug!("Discarding status from superseded poll loop {}", generation);
            return ControlFlow::Break(());
        }

        match classify(&status) {
            PollOutcome::Failed(message) => {
                warn!("Processing failed: {}", message);
                state.fail(message.clone());
                drop(state);
                self.emit(SessionEvent::ProcessingFailed(message));
                self.emit(SessionEvent::PhaseChanged(SessionPhase::Error));
                self.emit(SessionEvent::RefreshSaved);
                ControlFlow::Break(())
            }
            PollOutcome::Done => {
                info!("Processing complete");
                state.complete();
                drop(state);
                self.emit(SessionEvent::Completed);
                self.emit(SessionEvent::PhaseChanged(SessionPhase::Idle));
                self.emit(SessionEvent::RefreshNotes);
                self.emit(SessionEvent::RefreshSaved);
                self.schedule_auto_select();
                ControlFlow::Break(())
            }
            PollOutcome::InProgress(Some(step)) => {
                if state.update_step(step.clone()) {
                    drop(state);
                    self.emit(SessionEvent::StepChanged(step));
                }
                ControlFlow::Continue(())
            }
            PollOutcome::InProgress(None) => ControlFlow::Continue(()),
        }
    }

    fn schedule_auto_select(&self) {
        let state = self.state.clone();
        let events = self.events.clone();
        let grace = self.completion_grace;
        tokio::spawn(async move {
            sleep(grace).await;
            if state.get().await.phase() == SessionPhase::Idle {
                let _ = events.send(SessionEvent::AutoSelectDue);
            }
        });
    }
}

#[derive(Default)]
pub(crate) struct StatusPoller {
    current: Mutex<Option<CancellationToken>>,
}

impl StatusPoller {
    /// Cancel any running loop and start one owned by `generation`.
    pub fn restart(&self, ctx: Arc<PollContext>, generation: u64) {
        let token = CancellationToken::new();
        if let Some(previous) = self.slot().replace(token.clone()) {
            previous.cancel();
        }
        tokio::spawn(poll_loop(ctx, generation, token));
    }

    pub fn cancel(&self) {
        if let Some(token) = self.slot().take() {
            token.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot()
            .as_ref()
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn poll_loop(ctx: Arc<PollContext>, generation: u64, token: CancellationToken) {
    debug!("Poll loop {} started", generation);
    let mut ticker = interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let status = tokio::select! {
            _ = token.cancelled() => break,
            result = ctx.api.recording_status() => result,
        };

        match status {
            Ok(status) => {
                if ctx.apply(generation, status).await.is_break() {
                    token.cancel();
                    break;
                }
            }
            // Transient: the next tick tries again.
            Err(e) => debug!("Status poll failed: {}", e),
        }
    }
    debug!("Poll loop {} finished", generation);
}
