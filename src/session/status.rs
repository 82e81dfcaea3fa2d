//! Interpretation of `GET /api/recording/status` responses.
//!
//! The backend signals completion with a string match, so that contract lives
//! here and nowhere else.

use crate::backend::RecordingStatus;

pub const IDLE_STATE: &str = "idle";
pub const DONE_STEP: &str = "Done!";

/// What one poll tick means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Failed(String),
    Done,
    InProgress(Option<String>),
}

pub fn is_processing_done(status: &RecordingStatus) -> bool {
    status.state == IDLE_STATE && status.step.as_deref() == Some(DONE_STEP)
}

pub fn classify(status: &RecordingStatus) -> PollOutcome {
    if let Some(error) = status.error.as_deref().filter(|e| !e.is_empty()) {
        return PollOutcome::Failed(error.to_string());
    }
    if is_processing_done(status) {
        return PollOutcome::Done;
    }
    PollOutcome::InProgress(status.step.clone().filter(|s| !s.is_empty()))
}
