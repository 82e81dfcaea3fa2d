use super::state::SessionPhase;

/// Things the session tells the shell about. Sent on an unbounded channel so
/// the poll loop never waits on the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Transient user-facing message.
    Notice(String),
    PhaseChanged(SessionPhase),
    StepChanged(String),
    ProcessingFailed(String),
    Completed,
    RefreshNotes,
    RefreshSaved,
    /// The completion grace period elapsed with the session still idle.
    AutoSelectDue,
}
