use crate::backend::{Meeting, StartRecordingRequest};

/// Title used when the user picks "custom" without typing anything.
pub const UNTITLED_RECORDING: &str = "Untitled Recording";

/// What the next recording is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeetingSelection {
    /// A calendar event, sent to the backend as `meeting`.
    Calendar(Meeting),
    /// Free text with no calendar metadata, sent as `custom_title`.
    Custom { title: String },
}

impl MeetingSelection {
    pub fn custom(title: &str) -> Self {
        let title = title.trim();
        let title = if title.is_empty() {
            UNTITLED_RECORDING
        } else {
            title
        };
        MeetingSelection::Custom {
            title: title.to_string(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MeetingSelection::Calendar(meeting) => &meeting.title,
            MeetingSelection::Custom { title } => title,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, MeetingSelection::Custom { .. })
    }
}

/// Build the start body for an optional selection. Absent fields are
/// omitted entirely, never sent empty.
pub fn start_request_for(selection: Option<&MeetingSelection>) -> StartRecordingRequest {
    match selection {
        Some(MeetingSelection::Calendar(meeting)) => StartRecordingRequest {
            meeting: Some(meeting.clone()),
            custom_title: None,
        },
        Some(MeetingSelection::Custom { title }) => StartRecordingRequest {
            meeting: None,
            custom_title: Some(title.clone()),
        },
        None => StartRecordingRequest::default(),
    }
}
