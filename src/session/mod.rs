//! Recording session module.
//!
//! Owns the recording lifecycle against the backend: start with the current
//! meeting selection, stop, then poll processing status until the backend
//! reports completion or an error.

pub mod controller;
pub mod events;
mod poller;
pub mod state;
pub mod status;

pub use controller::{RecordingSessionController, SessionError, SessionTimings};
pub use events::SessionEvent;
pub use state::{SessionPhase, SessionState, SessionStateHandle};
pub use status::{classify, is_processing_done, PollOutcome, DONE_STEP};
