//! In-memory `BackendApi` for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::client::BackendApi;
use super::error::{ClientError, ClientResult};
use super::models::{
    DisplayConfig, Meeting, NoteEntry, RecordingStatus, SavedRecording, SetupStatus,
    StartRecordingRequest,
};

pub fn meeting(id: &str, title: &str) -> Meeting {
    Meeting {
        id: id.to_string(),
        title: title.to_string(),
        start: "2026-10-19T10:00:00Z".to_string(),
        end: "2026-10-19T10:30:00Z".to_string(),
        attendees: Vec::new(),
        description: String::new(),
        meeting_link: String::new(),
    }
}

pub fn status(state: &str, step: Option<&str>, error: Option<&str>) -> RecordingStatus {
    RecordingStatus {
        state: state.to_string(),
        step: step.map(str::to_string),
        error: error.map(str::to_string),
        elapsed_seconds: 0,
    }
}

fn rejected(what: &str) -> ClientError {
    ClientError::Rejected {
        url: format!("http://fake/{what}"),
        message: format!("{what} refused"),
    }
}

pub struct FakeBackend {
    pub current: Mutex<Option<Meeting>>,
    pub upcoming: Mutex<Vec<Meeting>>,
    pub current_fails: AtomicBool,
    pub upcoming_fails: AtomicBool,
    pub fetch_delay: Mutex<Duration>,

    pub start_fails: AtomicBool,
    pub stop_fails: AtomicBool,
    pub retry_fails: AtomicBool,
    pub start_requests: Mutex<Vec<StartRecordingRequest>>,
    pub retried: Mutex<Vec<String>>,

    /// Served in order; `None` entries are transport-style failures.
    pub scripted_statuses: Mutex<VecDeque<Option<RecordingStatus>>>,
    /// Served once the script runs out.
    pub steady_status: Mutex<RecordingStatus>,
    pub status_delay: Mutex<Duration>,
    pub status_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            current: Mutex::new(None),
            upcoming: Mutex::new(Vec::new()),
            current_fails: AtomicBool::new(false),
            upcoming_fails: AtomicBool::new(false),
            fetch_delay: Mutex::new(Duration::ZERO),
            start_fails: AtomicBool::new(false),
            stop_fails: AtomicBool::new(false),
            retry_fails: AtomicBool::new(false),
            start_requests: Mutex::new(Vec::new()),
            retried: Mutex::new(Vec::new()),
            scripted_statuses: Mutex::new(VecDeque::new()),
            steady_status: Mutex::new(status("processing", Some("Transcribing audio..."), None)),
            status_delay: Mutex::new(Duration::ZERO),
            status_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl FakeBackend {
    pub fn set_steady_status(&self, status: RecordingStatus) {
        *self.steady_status.lock().unwrap() = status;
    }

    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = Option<RecordingStatus>>) {
        self.scripted_statuses.lock().unwrap().extend(statuses);
    }

    async fn fetch_pause(&self) {
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn health(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn display_config(&self) -> ClientResult<DisplayConfig> {
        Ok(DisplayConfig::default())
    }

    async fn setup_status(&self) -> ClientResult<SetupStatus> {
        Ok(SetupStatus::default())
    }

    async fn current_meeting(&self) -> ClientResult<Option<Meeting>> {
        self.fetch_pause().await;
        if self.current_fails.load(Ordering::SeqCst) {
            return Err(rejected("current"));
        }
        Ok(self.current.lock().unwrap().clone())
    }

    async fn upcoming_meetings(&self) -> ClientResult<Vec<Meeting>> {
        self.fetch_pause().await;
        if self.upcoming_fails.load(Ordering::SeqCst) {
            return Err(rejected("upcoming"));
        }
        Ok(self.upcoming.lock().unwrap().clone())
    }

    async fn start_recording(&self, request: &StartRecordingRequest) -> ClientResult<()> {
        if self.start_fails.load(Ordering::SeqCst) {
            return Err(rejected("start"));
        }
        self.start_requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn stop_recording(&self) -> ClientResult<()> {
        if self.stop_fails.load(Ordering::SeqCst) {
            return Err(rejected("stop"));
        }
        Ok(())
    }

    async fn recording_status(&self) -> ClientResult<RecordingStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let delay = *self.status_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.scripted_statuses.lock().unwrap().pop_front();
        match scripted {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(rejected("status")),
            None => Ok(self.steady_status.lock().unwrap().clone()),
        }
    }

    async fn saved_recordings(&self) -> ClientResult<Vec<SavedRecording>> {
        Ok(Vec::new())
    }

    async fn retry_saved_recording(&self, id: &str) -> ClientResult<()> {
        if self.retry_fails.load(Ordering::SeqCst) {
            return Err(rejected("retry"));
        }
        self.retried.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_notes(&self) -> ClientResult<Vec<NoteEntry>> {
        Ok(Vec::new())
    }
}
