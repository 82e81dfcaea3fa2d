use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notetaker")]
#[command(about = "Record meetings and turn them into notes", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Launch the backend and start the interactive shell (default)
    Run,
    /// Show the backend's recording status
    Status,
    /// List recordings whose processing failed
    Saved,
    /// Re-process a saved recording
    Retry(RetryCliArgs),
    /// Show the current or upcoming calendar meetings
    Meetings(MeetingsCliArgs),
    /// List generated notes
    Notes,
    /// Inspect or change backend settings
    Settings(SettingsCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct RetryCliArgs {
    /// ID of the saved recording
    pub id: String,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingsCliArgs {
    /// List upcoming meetings instead of the current one
    #[arg(short, long)]
    pub upcoming: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SettingsCliArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show settings and setup status
    Show,
    /// Update settings, e.g. `set NOTES_DIR=~/notes`
    Set {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Upload a Google OAuth credentials.json
    Credentials { file: PathBuf },
}
