use anyhow::Result;
use clap::Parser;
use notetaker::{
    app,
    cli::{
        handle_meetings_command, handle_notes_command, handle_retry_command,
        handle_saved_command, handle_settings_command, handle_status_command, Cli, CliCommand,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("notetaker {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(CliCommand::Status) => handle_status_command().await,
        Some(CliCommand::Saved) => handle_saved_command().await,
        Some(CliCommand::Retry(args)) => handle_retry_command(args).await,
        Some(CliCommand::Meetings(args)) => handle_meetings_command(args).await,
        Some(CliCommand::Notes) => handle_notes_command().await,
        Some(CliCommand::Settings(args)) => handle_settings_command(args).await,
        Some(CliCommand::Run) | None => app::run_shell().await,
    }
}
