//! Typed access to the local backend's HTTP API.

pub mod client;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod models;

pub use client::{BackendApi, BackendClient};
pub use error::{ClientError, ClientResult};
pub use models::{
    Attendee, DisplayConfig, Meeting, NoteEntry, RecordingStatus, SavedRecording, Settings,
    SetupStatus, StartRecordingRequest, UploadResult,
};
