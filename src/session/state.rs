//! Recording session state and shared handle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::meeting::MeetingSelection;

/// Phase of the recording lifecycle as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Recording,
    Processing,
    Error,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Processing => "processing",
            Self::Error => "error",
        }
    }

    /// The selection is frozen once a recording starts.
    pub fn accepts_selection(&self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }

    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the session. Fields are private so every change goes through
/// a transition that keeps them consistent with `phase`.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    started_at: Option<DateTime<Utc>>,
    selected_meeting: Option<MeetingSelection>,
    last_step: Option<String>,
    last_error: Option<String>,
    poll_generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            started_at: None,
            selected_meeting: None,
            last_step: None,
            last_error: None,
            poll_generation: 0,
        }
    }
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn selected_meeting(&self) -> Option<&MeetingSelection> {
        self.selected_meeting.as_ref()
    }

    pub fn last_step(&self) -> Option<&str> {
        self.last_step.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn poll_generation(&self) -> u64 {
        self.poll_generation
    }

    /// Seconds since the recording started, while recording.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> Option<u64> {
        match (self.phase, self.started_at) {
            (SessionPhase::Recording, Some(started)) => {
                Some((now - started).num_seconds().max(0) as u64)
            }
            _ => None,
        }
    }

    pub fn invariants_hold(&self) -> bool {
        let recording_has_start = (self.phase == SessionPhase::Recording) == self.started_at.is_some();
        let error_has_message = (self.phase == SessionPhase::Error) == self.last_error.is_some();
        recording_has_start && error_has_message
    }

    pub(crate) fn attach(&mut self, selection: MeetingSelection) {
        self.selected_meeting = Some(selection);
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected_meeting = None;
    }

    pub(crate) fn begin_recording(&mut self, now: DateTime<Utc>) {
        self.phase = SessionPhase::Recording;
        self.started_at = Some(now);
        self.last_step = None;
        self.last_error = None;
    }

    /// Enter processing and return the generation the new poll loop owns.
    pub(crate) fn begin_processing(&mut self, step: &str) -> u64 {
        self.phase = SessionPhase::Processing;
        self.started_at = None;
        self.last_step = Some(step.to_string());
        self.last_error = None;
        self.poll_generation += 1;
        self.poll_generation
    }

    pub(crate) fn update_step(&mut self, step: String) -> bool {
        if self.last_step.as_deref() == Some(step.as_str()) {
            return false;
        }
        self.last_step = Some(step);
        true
    }

    pub(crate) fn complete(&mut self) {
        self.phase = SessionPhase::Idle;
        self.started_at = None;
        self.selected_meeting = None;
        self.last_step = None;
        self.last_error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = SessionPhase::Error;
        self.started_at = None;
        self.last_error = Some(message);
    }
}

/// Thread-safe handle shared between the controller, the poll loop and the shell.
#[derive(Clone, Default)]
pub struct SessionStateHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStateHandle {
    pub async fn get(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_recording_tracks_start_time() {
        let mut state = SessionState::default();
        assert!(state.invariants_hold());

        let now = Utc::now();
        state.begin_recording(now);
        assert_eq!(state.phase(), SessionPhase::Recording);
        assert_eq!(state.elapsed_seconds(now + Duration::seconds(75)), Some(75));
        assert!(state.invariants_hold());

        state.begin_processing("Transcribing audio...");
        assert!(state.started_at().is_none());
        assert_eq!(state.elapsed_seconds(now), None);
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_processing_bumps_generation() {
        let mut state = SessionState::default();
        let first = state.begin_processing("a");
        let second = state.begin_processing("b");
        assert!(second > first);
        assert_eq!(state.poll_generation(), second);
    }

    #[test]
    fn test_completion_clears_selection() {
        let mut state = SessionState::default();
        state.attach(MeetingSelection::custom("Retro"));
        state.begin_recording(Utc::now());
        state.begin_processing("Transcribing audio...");
        state.complete();

        assert_eq!(state.phase(), SessionPhase::Idle);
        assert!(state.selected_meeting().is_none());
        assert!(state.last_step().is_none());
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_leaving_error_drops_the_message() {
        let mut state = SessionState::default();
        state.fail("boom".to_string());
        state.begin_recording(Utc::now());
        assert!(state.last_error().is_none());
        assert!(state.invariants_hold());

        state.fail("boom".to_string());
        state.begin_processing("Transcribing audio...");
        assert!(state.last_error().is_none());
        assert!(state.invariants_hold());

        state.fail("boom".to_string());
        state.complete();
        assert!(state.invariants_hold());
    }

    #[test]
    fn test_failure_keeps_selection_and_message() {
        let mut state = SessionState::default();
        state.attach(MeetingSelection::custom("Retro"));
        state.begin_processing("Transcribing audio...");
        state.fail("boom".to_string());

        assert_eq!(state.phase(), SessionPhase::Error);
        assert_eq!(state.last_error(), Some("boom"));
        assert!(state.selected_meeting().is_some());
        assert!(state.invariants_hold());
        assert!(state.phase().accepts_selection());
    }

    #[test]
    fn test_step_update_reports_changes_only() {
        let mut state = SessionState::default();
        state.begin_processing("Transcribing audio...");
        assert!(!state.update_step("Transcribing audio...".to_string()));
        assert!(state.update_step("Generating notes...".to_string()));
        assert_eq!(state.last_step(), Some("Generating notes..."));
    }
}
