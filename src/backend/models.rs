//! Wire types for the backend HTTP API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub organizer: bool,
}

/// A calendar event as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meeting_link: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentMeetingResponse {
    pub meeting: Option<Meeting>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingMeetingsResponse {
    #[serde(default)]
    pub meetings: Vec<Meeting>,
}

/// Body of `POST /api/recording/start`. At most one field is present; the
/// backend treats a missing field differently from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StartRecordingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting: Option<Meeting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
}

/// Response of `GET /api/recording/status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordingStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub step: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: u64,
}

/// A recording whose processing failed and which the backend kept for retry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedRecording {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "error", default)]
    pub error_message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedRecordingsResponse {
    #[serde(default)]
    pub recordings: Vec<SavedRecording>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub obsidian_vault_name: String,
    #[serde(default)]
    pub obsidian_notes_subpath: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoteEntry {
    pub filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub drive_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotesResponse {
    #[serde(default)]
    pub notes: Vec<NoteEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SetupStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub gemini_configured: bool,
    #[serde(default)]
    pub google_configured: bool,
    #[serde(default)]
    pub paths_configured: bool,
}

/// Backend settings are a flat key/value map; secrets come back masked.
pub type Settings = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl UploadResult {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn standup() -> Meeting {
        Meeting {
            id: "evt-1".to_string(),
            title: "Standup".to_string(),
            start: "2026-10-19T09:00:00Z".to_string(),
            end: "2026-10-19T09:15:00Z".to_string(),
            attendees: vec![Attendee {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                organizer: true,
            }],
            description: String::new(),
            meeting_link: String::new(),
        }
    }

    #[test]
    fn test_start_request_without_selection_is_empty_object() {
        let body = serde_json::to_value(StartRecordingRequest::default()).unwrap();
        assert_eq!(body, json!({}));
    }

    #[test]
    fn test_start_request_with_custom_title_omits_meeting() {
        let body = serde_json::to_value(StartRecordingRequest {
            meeting: None,
            custom_title: Some("1:1".to_string()),
        })
        .unwrap();
        assert_eq!(body, json!({ "custom_title": "1:1" }));
    }

    #[test]
    fn test_start_request_with_meeting_omits_custom_title() {
        let body = serde_json::to_value(StartRecordingRequest {
            meeting: Some(standup()),
            custom_title: None,
        })
        .unwrap();
        assert!(body.get("custom_title").is_none());
        assert_eq!(body["meeting"]["title"], "Standup");
        assert_eq!(body["meeting"]["attendees"][0]["organizer"], true);
    }

    #[test]
    fn test_status_tolerates_missing_fields() {
        let status: RecordingStatus = serde_json::from_value(json!({ "state": "idle" })).unwrap();
        assert_eq!(status.state, "idle");
        assert!(status.step.is_none());
        assert!(status.error.is_none());

        let status: RecordingStatus =
            serde_json::from_value(json!({ "state": "processing", "step": "Transcribing...", "error": null, "elapsed_seconds": 0 }))
                .unwrap();
        assert_eq!(status.step.as_deref(), Some("Transcribing..."));
    }

    #[test]
    fn test_saved_recording_maps_error_field() {
        let saved: SavedRecordingsResponse = serde_json::from_value(json!({
            "recordings": [
                { "id": "2026-10-19_09-00-00_standup", "title": "Standup", "timestamp": "2026-10-19_09-00-00", "error": "disk full", "retries": 3 }
            ]
        }))
        .unwrap();
        assert_eq!(saved.recordings[0].error_message, "disk full");
        assert_eq!(saved.recordings[0].retries, 3);
    }

    #[test]
    fn test_calendar_meeting_without_optional_fields() {
        let response: CurrentMeetingResponse = serde_json::from_value(json!({
            "meeting": { "title": "Design review", "start": "", "end": "", "attendees": [] }
        }))
        .unwrap();
        let meeting = response.meeting.unwrap();
        assert_eq!(meeting.id, "");
        assert_eq!(meeting.title, "Design review");

        let response: CurrentMeetingResponse =
            serde_json::from_value(json!({ "meeting": null, "error": "Google credentials not configured" }))
                .unwrap();
        assert!(response.meeting.is_none());
    }
}
