//! Interactive shell: launches the backend, connects to it, and drives the
//! recording session from stdin commands and periodic timers.

pub mod commands;
pub mod render;

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::backend::{BackendApi, BackendClient, DisplayConfig, NoteEntry, SavedRecording, Settings};
use crate::config::Config;
use crate::meeting::{AutoSelectOutcome, MeetingSelector, SelectionError};
use crate::notes::obsidian_uri;
use crate::session::{
    RecordingSessionController, SessionError, SessionEvent, SessionPhase, SessionTimings,
};
use crate::supervisor::{BackendSupervisor, LaunchLocations, LaunchPlan, ReadinessConfig};

use commands::{ShellCommand, HELP};

pub async fn run_shell() -> Result<()> {
    info!("Starting meeting note taker");

    let config = Config::load()?;

    let supervisor = build_supervisor(&config)?;
    println!(
        "Starting backend ({}: {})...",
        supervisor.plan().mode.as_str(),
        supervisor.plan().executable.display()
    );
    match supervisor.start().await {
        Ok(signal) => info!("Backend ready (via {})", signal.as_str()),
        // The shell stays usable; it keeps trying to connect below.
        Err(e) => error!("Backend failed to start: {}", e),
    }

    let client = Arc::new(
        BackendClient::new(&config.backend.base_url(), config.backend.request_timeout())
            .context("Failed to create backend client")?,
    );
    let (events_tx, events_rx) = unbounded_channel();
    let api: Arc<dyn BackendApi> = client.clone();
    let session = RecordingSessionController::new(
        api.clone(),
        events_tx,
        SessionTimings::from_config(&config.session),
    );
    let selector = Arc::new(MeetingSelector::new(
        api,
        session.clone(),
        config.session.picker_limit,
    ));

    let mut shell = Shell {
        client,
        session: session.clone(),
        selector,
        display: DisplayConfig::default(),
        notes: Vec::new(),
        saved: Vec::new(),
        connected: false,
        reported_unreachable: false,
        settings_view: false,
    };

    let result = shell.run(&config, events_rx).await;

    session.shutdown();
    supervisor.stop();
    info!("Shell stopped");
    result
}

fn build_supervisor(config: &Config) -> Result<BackendSupervisor> {
    let locations = LaunchLocations::from_config(&config.backend)?;
    let plan = LaunchPlan::resolve(&locations, &config.backend.host, config.backend.port)?;
    Ok(BackendSupervisor::new(
        plan,
        ReadinessConfig::from_backend(&config.backend),
    ))
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

struct Shell {
    client: Arc<BackendClient>,
    session: RecordingSessionController,
    selector: Arc<MeetingSelector>,
    display: DisplayConfig,
    notes: Vec<NoteEntry>,
    saved: Vec<SavedRecording>,
    connected: bool,
    reported_unreachable: bool,
    settings_view: bool,
}

impl Shell {
    async fn run(
        &mut self,
        config: &Config,
        mut events: UnboundedReceiver<SessionEvent>,
    ) -> Result<()> {
        let session = &config.session;
        let mut reconnect = ticker(Duration::from_secs(session.reconnect_interval_secs));
        let mut auto_select = ticker(Duration::from_secs(session.auto_select_interval_secs));
        let mut notes_refresh = ticker(Duration::from_secs(session.notes_refresh_interval_secs));
        let mut saved_refresh = ticker(Duration::from_secs(session.saved_refresh_interval_secs));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        self.connect().await;
        println!("Type 'help' for commands.");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line.context("Failed to read from stdin")? {
                        Some(line) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match line.parse::<ShellCommand>() {
                                Ok(ShellCommand::Quit) => break,
                                Ok(command) => self.handle_command(command).await,
                                Err(e) => println!("{e}"),
                            }
                        }
                        None => {
                            debug!("stdin closed");
                            break;
                        }
                    }
                }
                Some(event) = events.recv() => self.handle_event(event).await,
                _ = reconnect.tick(), if !self.connected => self.connect().await,
                _ = auto_select.tick(), if self.connected => self.auto_select().await,
                _ = notes_refresh.tick(), if self.connected => self.refresh_notes().await,
                _ = saved_refresh.tick(), if self.connected => self.refresh_saved().await,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Health, setup status and display config, in that order.
    async fn connect(&mut self) {
        let ready = async {
            self.client.health().await?;
            let setup = self.client.setup_status().await?;
            let display = self.client.display_config().await?;
            Ok::<_, crate::backend::ClientError>((setup, display))
        }
        .await;

        let (setup, display) = match ready {
            Ok(result) => result,
            Err(e) => {
                debug!("Connect failed: {}", e);
                if !self.reported_unreachable {
                    println!("Backend not reachable, retrying...");
                    self.reported_unreachable = true;
                }
                return;
            }
        };

        self.connected = true;
        self.reported_unreachable = false;
        self.display = display;
        info!("Connected to backend at {}", self.client.base_url());

        if !setup.ready {
            println!("Setup required");
            for line in render::setup_lines(&setup) {
                println!("  {line}");
            }
            self.open_settings().await;
        } else {
            println!("Ready to record");
            self.auto_select().await;
            self.refresh_notes().await;
            self.refresh_saved().await;
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Notice(message) => println!("! {message}"),
            SessionEvent::PhaseChanged(SessionPhase::Recording) => println!("Recording..."),
            SessionEvent::PhaseChanged(SessionPhase::Processing) => println!("Processing..."),
            SessionEvent::PhaseChanged(_) => {}
            SessionEvent::StepChanged(step) => println!("  {step}"),
            SessionEvent::ProcessingFailed(message) => println!("Error: {message}"),
            SessionEvent::Completed => println!("Notes saved!"),
            SessionEvent::RefreshNotes => self.refresh_notes().await,
            SessionEvent::RefreshSaved => self.refresh_saved().await,
            SessionEvent::AutoSelectDue => {
                println!("Ready to record");
                self.auto_select().await;
            }
        }
    }

    async fn handle_command(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Record => report(self.session.toggle().await),
            ShellCommand::Start => report(self.session.start_recording().await),
            ShellCommand::Stop => report(self.session.stop_recording().await),
            ShellCommand::Pick => self.open_picker().await,
            ShellCommand::Select(position) => match self.selector.pick(position - 1).await {
                Ok(meeting) => println!("Selected: {}", render::meeting_summary(&meeting)),
                Err(e) => println!("{e}"),
            },
            ShellCommand::Custom(title) => match self.selector.use_custom_title(&title).await {
                Ok(selection) => println!("Selected: {}", selection.title()),
                Err(e) => println!("{e}"),
            },
            ShellCommand::Cancel => self.selector.close_picker().await,
            ShellCommand::Retry(id) => report(self.session.retry_saved(&id).await),
            ShellCommand::Saved => {
                self.refresh_saved().await;
                self.print_saved();
            }
            ShellCommand::Notes => {
                self.refresh_notes().await;
                self.print_notes();
            }
            ShellCommand::Open(position) => self.open_note(position),
            ShellCommand::Status => self.print_status().await,
            ShellCommand::Settings => self.open_settings().await,
            ShellCommand::Set(values) => self.update_settings(&values).await,
            ShellCommand::Credentials(path) => self.upload_credentials(&path).await,
            ShellCommand::Done => self.close_settings().await,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => {}
        }
    }

    async fn auto_select(&mut self) {
        match self.selector.auto_select().await {
            AutoSelectOutcome::Adopted(meeting) => {
                println!("Meeting: {}", render::meeting_summary(&meeting))
            }
            AutoSelectOutcome::NoMeeting => println!("No multi-person meetings found"),
            AutoSelectOutcome::Unavailable(_) => println!("Calendar unavailable"),
            AutoSelectOutcome::Suppressed(_) => {}
        }
    }

    async fn open_picker(&mut self) {
        match self.selector.open_picker().await {
            Ok(meetings) if meetings.is_empty() => {
                println!("No upcoming meetings. Use 'custom [title]' or 'cancel'.");
            }
            Ok(meetings) => {
                for (i, meeting) in meetings.iter().enumerate() {
                    println!("{}", render::picker_line(i + 1, meeting));
                }
                println!("Use 'select <n>', 'custom [title]' or 'cancel'.");
            }
            Err(SelectionError::PickerClosed) => {}
            Err(e) => println!("{e}"),
        }
    }

    async fn refresh_notes(&mut self) {
        match self.client.list_notes().await {
            Ok(notes) => self.notes = notes,
            Err(e) => debug!("Notes refresh failed: {}", e),
        }
    }

    async fn refresh_saved(&mut self) {
        match self.client.saved_recordings().await {
            Ok(saved) => self.saved = saved,
            Err(e) => debug!("Saved recordings refresh failed: {}", e),
        }
    }

    fn print_notes(&self) {
        if self.notes.is_empty() {
            println!("No recordings yet");
            return;
        }
        for (i, note) in self.notes.iter().enumerate() {
            println!("{}", render::note_line(i + 1, note));
        }
    }

    fn print_saved(&self) {
        if self.saved.is_empty() {
            println!("No failed recordings");
            return;
        }
        for recording in &self.saved {
            println!("{}", render::saved_line(recording));
        }
        println!("Use 'retry <id>' to process one again.");
    }

    fn open_note(&self, position: usize) {
        let Some(note) = self.notes.get(position - 1) else {
            println!("No note at position {position} (run 'notes' first)");
            return;
        };
        match obsidian_uri(&self.display, &note.filename) {
            Some(uri) => println!("{uri}"),
            None => println!("No Obsidian vault configured"),
        }
        if !note.drive_url.is_empty() {
            println!("Drive: {}", note.drive_url);
        }
    }

    async fn print_status(&self) {
        let state = self.session.snapshot().await;
        if !self.connected {
            println!("Backend not reachable");
        }
        println!("{}", render::status_line(&state, Utc::now()));
        println!("Meeting: {}", render::selection_summary(state.selected_meeting()));
        if self.settings_view {
            println!("(settings open, 'done' to return)");
        }
    }

    async fn open_settings(&mut self) {
        self.settings_view = true;
        self.selector.set_settings_open(true);
        match self.client.settings().await {
            Ok(settings) => {
                println!("Settings:");
                for line in render::settings_lines(&settings) {
                    println!("  {line}");
                }
            }
            Err(e) => warn!("Failed to load settings: {}", e),
        }
        println!("Use 'set KEY=VALUE', 'credentials <file>' or 'done'.");
    }

    async fn update_settings(&mut self, values: &Settings) {
        match self.client.update_settings(values).await {
            Ok(_) => println!("Saved"),
            Err(e) => println!("Error: {e}"),
        }
    }

    async fn upload_credentials(&mut self, path: &Path) {
        match self.client.upload_credentials(path).await {
            Ok(result) if result.is_ok() => println!("credentials.json uploaded"),
            Ok(result) => println!(
                "{}",
                result.message.as_deref().unwrap_or("Upload failed")
            ),
            Err(e) => {
                warn!("Credentials upload failed: {}", e);
                println!("Upload failed");
            }
        }
    }

    /// Leave settings, re-checking setup before enabling recording again.
    async fn close_settings(&mut self) {
        self.settings_view = false;
        self.selector.set_settings_open(false);

        match self.client.setup_status().await {
            Ok(setup) if setup.ready => {
                if let Ok(display) = self.client.display_config().await {
                    self.display = display;
                }
                println!("Ready to record");
                self.auto_select().await;
                self.refresh_notes().await;
                self.refresh_saved().await;
            }
            Ok(setup) => {
                println!("Setup required");
                for line in render::setup_lines(&setup) {
                    println!("  {line}");
                }
            }
            Err(e) => println!("Backend not reachable ({e})"),
        }
    }
}

/// Failures already reached the user as notices; only log rejections here.
fn report(result: Result<SessionPhase, SessionError>) {
    match result {
        Ok(phase) => debug!("Session now {}", phase),
        Err(SessionError::InvalidPhase { action, phase }) => {
            println!("Cannot {action} while {phase}")
        }
        Err(e) => debug!("{}", e),
    }
}
