//! Command line entry points. Each handler talks to an already running
//! backend through the backend client.

use anyhow::{Context, Result};

use crate::backend::BackendClient;
use crate::config::Config;

pub mod args;
pub mod calendar;
pub mod recording;
pub mod settings;

pub use args::{Cli, CliCommand};
pub use calendar::{handle_meetings_command, handle_notes_command};
pub use recording::{handle_retry_command, handle_saved_command, handle_status_command};
pub use settings::handle_settings_command;

fn connect() -> Result<BackendClient> {
    let config = Config::load()?;
    BackendClient::new(&config.backend.base_url(), config.backend.request_timeout())
        .context("Failed to create backend client")
}
