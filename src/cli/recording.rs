//! One-shot commands against a running backend: status, saved, retry.

use anyhow::{Context, Result};

use super::args::RetryCliArgs;
use super::connect;
use crate::app::render::{format_elapsed, saved_line};
use crate::backend::BackendApi;

pub async fn handle_status_command() -> Result<()> {
    let client = connect()?;
    let status = client
        .recording_status()
        .await
        .context("Failed to fetch recording status")?;

    println!("State: {}", status.state);
    if let Some(step) = status.step.as_deref().filter(|s| !s.is_empty()) {
        println!("Step: {step}");
    }
    if status.state == "recording" {
        println!("Elapsed: {}", format_elapsed(status.elapsed_seconds));
    }
    if let Some(error) = status.error.as_deref().filter(|e| !e.is_empty()) {
        println!("Error: {error}");
    }
    Ok(())
}

pub async fn handle_saved_command() -> Result<()> {
    let client = connect()?;
    let saved = client
        .saved_recordings()
        .await
        .context("Failed to fetch saved recordings")?;

    if saved.is_empty() {
        println!("No failed recordings.");
        return Ok(());
    }

    println!("Found {} saved recording(s):\n", saved.len());
    for recording in &saved {
        println!("{}", saved_line(recording));
    }
    println!("\nTo process one again, use: notetaker retry <ID>");
    Ok(())
}

pub async fn handle_retry_command(args: RetryCliArgs) -> Result<()> {
    let client = connect()?;
    client
        .retry_saved_recording(&args.id)
        .await
        .with_context(|| format!("Retry of {} failed", args.id))?;
    println!("Retry started for {}. Check progress with: notetaker status", args.id);
    Ok(())
}
