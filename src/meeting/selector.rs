//! Meeting selection: periodic auto-select from the calendar plus a manual
//! picker over upcoming meetings.
//!
//! Auto-select never overwrites a choice the user made or is making.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::selection::MeetingSelection;
use crate::backend::{BackendApi, ClientError, Meeting};
use crate::session::{RecordingSessionController, SessionError, SessionPhase};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Meeting picker is not open")]
    PickerClosed,
    #[error("No meeting at position {0}")]
    NoSuchOption(usize),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to load meetings: {0}")]
    Backend(#[from] ClientError),
}

/// Why an auto-select pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    SelectionAttached,
    PickerOpen,
    SettingsOpen,
    SessionActive(SessionPhase),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSelectOutcome {
    Adopted(Meeting),
    NoMeeting,
    Unavailable(String),
    Suppressed(Suppression),
}

#[derive(Debug, Default)]
struct Picker {
    open: bool,
    options: Vec<Meeting>,
    // Bumped on every open/close so a stale fetch can't repopulate the list.
    generation: u64,
}

pub struct MeetingSelector {
    api: Arc<dyn BackendApi>,
    session: RecordingSessionController,
    picker: Mutex<Picker>,
    settings_open: AtomicBool,
    picker_limit: usize,
}

impl MeetingSelector {
    pub fn new(
        api: Arc<dyn BackendApi>,
        session: RecordingSessionController,
        picker_limit: usize,
    ) -> Self {
        Self {
            api,
            session,
            picker: Mutex::new(Picker::default()),
            settings_open: AtomicBool::new(false),
            picker_limit,
        }
    }

    pub fn set_settings_open(&self, open: bool) {
        self.settings_open.store(open, Ordering::SeqCst);
    }

    pub async fn is_picker_open(&self) -> bool {
        self.picker.lock().await.open
    }

    async fn suppression(&self) -> Option<Suppression> {
        if self.picker.lock().await.open {
            return Some(Suppression::PickerOpen);
        }
        if self.settings_open.load(Ordering::SeqCst) {
            return Some(Suppression::SettingsOpen);
        }
        let state = self.session.snapshot().await;
        match state.phase() {
            SessionPhase::Recording | SessionPhase::Processing => {
                Some(Suppression::SessionActive(state.phase()))
            }
            _ if state.selected_meeting().is_some() => Some(Suppression::SelectionAttached),
            _ => None,
        }
    }

    /// Adopt the backend's current meeting when nothing else claims the
    /// selection. Conditions are checked again after the fetch.
    pub async fn auto_select(&self) -> AutoSelectOutcome {
        if let Some(reason) = self.suppression().await {
            debug!("Auto-select suppressed: {:?}", reason);
            return AutoSelectOutcome::Suppressed(reason);
        }

        let current = match self.api.current_meeting().await {
            Ok(current) => current,
            Err(e) => {
                warn!("Calendar unavailable: {}", e);
                return AutoSelectOutcome::Unavailable(e.to_string());
            }
        };

        let Some(meeting) = current else {
            return AutoSelectOutcome::NoMeeting;
        };

        if let Some(reason) = self.suppression().await {
            debug!("Auto-select result dropped: {:?}", reason);
            return AutoSelectOutcome::Suppressed(reason);
        }

        if self
            .session
            .attach_if_vacant(MeetingSelection::Calendar(meeting.clone()))
            .await
        {
            info!("Auto-selected current meeting: {}", meeting.title);
            AutoSelectOutcome::Adopted(meeting)
        } else {
            AutoSelectOutcome::Suppressed(Suppression::SelectionAttached)
        }
    }

    /// Open the picker and load up to `picker_limit` upcoming meetings.
    pub async fn open_picker(&self) -> Result<Vec<Meeting>, SelectionError> {
        let phase = self.session.snapshot().await.phase();
        if !phase.accepts_selection() {
            return Err(SessionError::InvalidPhase {
                action: "change meeting",
                phase,
            }
            .into());
        }

        let generation = {
            let mut picker = self.picker.lock().await;
            picker.open = true;
            picker.options.clear();
            picker.generation += 1;
            picker.generation
        };

        let mut meetings = self.api.upcoming_meetings().await?;
        meetings.truncate(self.picker_limit);

        let mut picker = self.picker.lock().await;
        if !picker.open || picker.generation != generation {
            debug!("Picker closed before meetings loaded");
            return Err(SelectionError::PickerClosed);
        }
        picker.options = meetings.clone();
        Ok(meetings)
    }

    pub async fn options(&self) -> Vec<Meeting> {
        self.picker.lock().await.options.clone()
    }

    /// Select an option by zero-based position and close the picker.
    pub async fn pick(&self, index: usize) -> Result<Meeting, SelectionError> {
        let meeting = {
            let picker = self.picker.lock().await;
            if !picker.open {
                return Err(SelectionError::PickerClosed);
            }
            picker
                .options
                .get(index)
                .cloned()
                .ok_or(SelectionError::NoSuchOption(index))?
        };

        self.session
            .attach_selection(MeetingSelection::Calendar(meeting.clone()))
            .await?;
        self.close_picker().await;
        Ok(meeting)
    }

    /// Use free text instead of a calendar meeting.
    pub async fn use_custom_title(&self, title: &str) -> Result<MeetingSelection, SelectionError> {
        let selection = MeetingSelection::custom(title);
        self.session.attach_selection(selection.clone()).await?;
        self.close_picker().await;
        Ok(selection)
    }

    pub async fn close_picker(&self) {
        let mut picker = self.picker.lock().await;
        picker.open = false;
        picker.options.clear();
        picker.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{meeting, FakeBackend};
    use crate::session::SessionTimings;
    use std::time::Duration;
    use tokio::sync::mpsc::unbounded_channel;

    fn setup() -> (Arc<FakeBackend>, RecordingSessionController, Arc<MeetingSelector>) {
        let fake = Arc::new(FakeBackend::default());
        let (tx, _rx) = unbounded_channel();
        let session = RecordingSessionController::new(fake.clone(), tx, SessionTimings::default());
        let selector = Arc::new(MeetingSelector::new(fake.clone(), session.clone(), 10));
        (fake, session, selector)
    }

    #[tokio::test]
    async fn test_auto_select_adopts_current_meeting() {
        let (fake, session, selector) = setup();
        *fake.current.lock().unwrap() = Some(meeting("evt-1", "Standup"));

        let outcome = selector.auto_select().await;
        assert!(matches!(outcome, AutoSelectOutcome::Adopted(ref m) if m.id == "evt-1"));
        assert_eq!(
            session.snapshot().await.selected_meeting().map(|s| s.title()),
            Some("Standup")
        );
    }

    #[tokio::test]
    async fn test_auto_select_reports_missing_and_unavailable() {
        let (fake, _session, selector) = setup();
        assert_eq!(selector.auto_select().await, AutoSelectOutcome::NoMeeting);

        fake.current_fails.store(true, Ordering::SeqCst);
        assert!(matches!(
            selector.auto_select().await,
            AutoSelectOutcome::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_auto_select_never_overwrites_user_choice() {
        let (fake, session, selector) = setup();
        *fake.current.lock().unwrap() = Some(meeting("evt-1", "Standup"));
        selector.use_custom_title("My notes").await.unwrap();

        assert_eq!(
            selector.auto_select().await,
            AutoSelectOutcome::Suppressed(Suppression::SelectionAttached)
        );
        assert_eq!(
            session.snapshot().await.selected_meeting().map(|s| s.title()),
            Some("My notes")
        );
    }

    #[tokio::test]
    async fn test_auto_select_suppressed_while_picker_or_settings_open() {
        let (fake, session, selector) = setup();
        *fake.current.lock().unwrap() = Some(meeting("evt-1", "Standup"));

        selector.open_picker().await.unwrap();
        assert_eq!(
            selector.auto_select().await,
            AutoSelectOutcome::Suppressed(Suppression::PickerOpen)
        );
        selector.close_picker().await;

        selector.set_settings_open(true);
        assert_eq!(
            selector.auto_select().await,
            AutoSelectOutcome::Suppressed(Suppression::SettingsOpen)
        );
        assert!(session.snapshot().await.selected_meeting().is_none());
    }

    #[tokio::test]
    async fn test_auto_select_drops_result_when_picker_opens_mid_fetch() {
        let (fake, session, selector) = setup();
        *fake.current.lock().unwrap() = Some(meeting("evt-1", "Standup"));
        *fake.fetch_delay.lock().unwrap() = Duration::from_millis(50);

        let auto = {
            let selector = selector.clone();
            tokio::spawn(async move { selector.auto_select().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let picker = {
            let selector = selector.clone();
            tokio::spawn(async move { selector.open_picker().await })
        };

        assert_eq!(
            auto.await.unwrap(),
            AutoSelectOutcome::Suppressed(Suppression::PickerOpen)
        );
        picker.await.unwrap().unwrap();
        assert!(session.snapshot().await.selected_meeting().is_none());
    }

    #[tokio::test]
    async fn test_auto_select_suppressed_while_recording() {
        let (fake, session, selector) = setup();
        session.start_recording().await.unwrap();
        *fake.current.lock().unwrap() = Some(meeting("evt-1", "Standup"));

        assert_eq!(
            selector.auto_select().await,
            AutoSelectOutcome::Suppressed(Suppression::SessionActive(SessionPhase::Recording))
        );
    }

    #[tokio::test]
    async fn test_picker_is_bounded_and_pick_closes_it() {
        let (fake, session, selector) = setup();
        *fake.upcoming.lock().unwrap() = (0..15)
            .map(|i| meeting(&format!("evt-{i}"), &format!("Meeting {i}")))
            .collect();

        let options = selector.open_picker().await.unwrap();
        assert_eq!(options.len(), 10);

        assert!(matches!(
            selector.pick(10).await,
            Err(SelectionError::NoSuchOption(10))
        ));
        let picked = selector.pick(2).await.unwrap();
        assert_eq!(picked.id, "evt-2");
        assert!(!selector.is_picker_open().await);
        assert_eq!(
            session.snapshot().await.selected_meeting().map(|s| s.title()),
            Some("Meeting 2")
        );
    }

    #[tokio::test]
    async fn test_closing_picker_discards_inflight_fetch() {
        let (fake, _session, selector) = setup();
        *fake.upcoming.lock().unwrap() = vec![meeting("evt-1", "Standup")];
        *fake.fetch_delay.lock().unwrap() = Duration::from_millis(50);

        let open = {
            let selector = selector.clone();
            tokio::spawn(async move { selector.open_picker().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        selector.close_picker().await;

        assert!(matches!(
            open.await.unwrap(),
            Err(SelectionError::PickerClosed)
        ));
        assert!(selector.options().await.is_empty());
    }

    #[tokio::test]
    async fn test_picker_stays_open_when_listing_fails() {
        let (fake, _session, selector) = setup();
        fake.upcoming_fails.store(true, Ordering::SeqCst);

        assert!(matches!(
            selector.open_picker().await,
            Err(SelectionError::Backend(_))
        ));
        assert!(selector.is_picker_open().await);
        selector.use_custom_title("").await.unwrap();
        assert!(!selector.is_picker_open().await);
    }

    #[tokio::test]
    async fn test_pick_rejected_when_closed_or_recording() {
        let (fake, session, selector) = setup();
        assert!(matches!(
            selector.pick(0).await,
            Err(SelectionError::PickerClosed)
        ));

        *fake.upcoming.lock().unwrap() = vec![meeting("evt-1", "Standup")];
        session.start_recording().await.unwrap();
        assert!(matches!(
            selector.open_picker().await,
            Err(SelectionError::Session(_))
        ));
        assert!(selector.use_custom_title("Late").await.is_err());
    }
}
