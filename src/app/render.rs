//! Text rendering shared by the shell and the one-shot CLI commands.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

use crate::backend::{Meeting, NoteEntry, SavedRecording, Settings, SetupStatus};
use crate::meeting::MeetingSelection;
use crate::notes::display_title;
use crate::session::{SessionPhase, SessionState};

pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Clock time of an RFC 3339 timestamp in `tz`, e.g. `9:05 AM`.
pub fn format_time_in<Tz>(iso: &str, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|time| time.with_timezone(tz).format("%-I:%M %p").to_string())
}

pub fn format_time(iso: &str) -> Option<String> {
    format_time_in(iso, &Local)
}

pub fn attendee_names(meeting: &Meeting) -> String {
    meeting
        .attendees
        .iter()
        .map(|a| if a.name.is_empty() { a.email.as_str() } else { a.name.as_str() })
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn meeting_summary_in<Tz>(meeting: &Meeting, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut line = meeting.title.clone();
    if let (Some(start), Some(end)) = (
        format_time_in(&meeting.start, tz),
        format_time_in(&meeting.end, tz),
    ) {
        line.push_str(&format!(" ({start} - {end})"));
    }
    let names = attendee_names(meeting);
    if !names.is_empty() {
        line.push_str(&format!(" with {names}"));
    }
    line
}

pub fn meeting_summary(meeting: &Meeting) -> String {
    meeting_summary_in(meeting, &Local)
}

pub fn selection_summary(selection: Option<&MeetingSelection>) -> String {
    match selection {
        Some(MeetingSelection::Calendar(meeting)) => meeting_summary(meeting),
        Some(MeetingSelection::Custom { title }) => format!("{title} (custom title)"),
        None => "No meeting selected".to_string(),
    }
}

/// One-line status, the way the record button and status label read.
pub fn status_line(state: &SessionState, now: DateTime<Utc>) -> String {
    match state.phase() {
        SessionPhase::Idle => "Ready to record".to_string(),
        SessionPhase::Recording => format!(
            "Recording... {}",
            format_elapsed(state.elapsed_seconds(now).unwrap_or(0))
        ),
        SessionPhase::Processing => match state.last_step() {
            Some(step) => format!("Processing... {step}"),
            None => "Processing...".to_string(),
        },
        SessionPhase::Error => format!(
            "Error: {}",
            state.last_error().unwrap_or("processing failed")
        ),
    }
}

pub fn picker_line(position: usize, meeting: &Meeting) -> String {
    let time = format_time(&meeting.start).unwrap_or_default();
    let names = attendee_names(meeting);
    let mut line = format!("{position:>2}. {:<8} {}", time, meeting.title);
    if !names.is_empty() {
        line.push_str(&format!(" [{}] {names}", meeting.attendees.len()));
    }
    line
}

pub fn saved_line(recording: &SavedRecording) -> String {
    let title = if recording.title.is_empty() {
        "Untitled"
    } else {
        recording.title.as_str()
    };
    format!("{}  {}  ({})", recording.id, title, recording.error_message)
}

pub fn note_line(position: usize, note: &NoteEntry) -> String {
    format!("{position:>2}. {}  {}", display_title(note), note.date)
}

fn badge(ok: bool) -> &'static str {
    if ok {
        "Configured"
    } else {
        "Not configured"
    }
}

pub fn setup_lines(setup: &SetupStatus) -> Vec<String> {
    vec![
        format!("Gemini API key:      {}", badge(setup.gemini_configured)),
        format!("Google credentials:  {}", badge(setup.google_configured)),
        format!("Note paths:          {}", badge(setup.paths_configured)),
    ]
}

pub fn settings_lines(settings: &Settings) -> Vec<String> {
    settings
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{key} = {s}"),
            other => format!("{key} = {other}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::meeting;
    use crate::backend::Attendee;

    #[test]
    fn test_elapsed_is_zero_padded() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(75), "00:01:15");
        assert_eq!(format_elapsed(3600 * 12 + 61), "12:01:01");
    }

    #[test]
    fn test_time_formatting() {
        assert_eq!(
            format_time_in("2026-10-19T09:05:00Z", &Utc).as_deref(),
            Some("9:05 AM")
        );
        assert_eq!(
            format_time_in("2026-10-19T14:30:00-02:00", &Utc).as_deref(),
            Some("4:30 PM")
        );
        assert!(format_time_in("tomorrow", &Utc).is_none());
    }

    #[test]
    fn test_meeting_summary_lists_attendees() {
        let mut standup = meeting("evt-1", "Standup");
        standup.attendees = vec![
            Attendee {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                organizer: true,
            },
            Attendee {
                name: String::new(),
                email: "bob@example.com".to_string(),
                organizer: false,
            },
        ];

        assert_eq!(
            meeting_summary_in(&standup, &Utc),
            "Standup (10:00 AM - 10:30 AM) with Ada, bob@example.com"
        );
    }

    #[test]
    fn test_status_line_shows_elapsed_while_recording() {
        let mut state = SessionState::default();
        assert_eq!(status_line(&state, Utc::now()), "Ready to record");

        let started = Utc::now();
        state.begin_recording(started);
        assert_eq!(
            status_line(&state, started + chrono::Duration::seconds(3725)),
            "Recording... 01:02:05"
        );
    }

    #[test]
    fn test_selection_summary_variants() {
        assert_eq!(selection_summary(None), "No meeting selected");
        assert_eq!(
            selection_summary(Some(&MeetingSelection::custom(""))),
            "Untitled Recording (custom title)"
        );
    }
}
