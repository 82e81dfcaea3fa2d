//! Meeting selection module.
//!
//! Decides which calendar meeting (or custom title) the next recording is
//! attributed to.

pub mod selection;
pub mod selector;

pub use selection::{start_request_for, MeetingSelection, UNTITLED_RECORDING};
pub use selector::{AutoSelectOutcome, MeetingSelector, SelectionError, Suppression};
