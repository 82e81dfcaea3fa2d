//! One-shot commands for meetings and notes.

use anyhow::{Context, Result};

use super::args::MeetingsCliArgs;
use super::connect;
use crate::app::render::{meeting_summary, note_line, picker_line};
use crate::backend::BackendApi;
use crate::config::Config;
use crate::notes::obsidian_uri;

pub async fn handle_meetings_command(args: MeetingsCliArgs) -> Result<()> {
    let client = connect()?;

    if !args.upcoming {
        match client
            .current_meeting()
            .await
            .context("Calendar unavailable")?
        {
            Some(meeting) => println!("{}", meeting_summary(&meeting)),
            None => println!("No multi-person meetings found"),
        }
        return Ok(());
    }

    let limit = Config::load()?.session.picker_limit;
    let mut meetings = client
        .upcoming_meetings()
        .await
        .context("Failed to load meetings")?;
    meetings.truncate(limit);

    if meetings.is_empty() {
        println!("No upcoming meetings.");
    }
    for (i, meeting) in meetings.iter().enumerate() {
        println!("{}", picker_line(i + 1, meeting));
    }
    Ok(())
}

pub async fn handle_notes_command() -> Result<()> {
    let client = connect()?;
    let notes = client.list_notes().await.context("Failed to list notes")?;
    if notes.is_empty() {
        println!("No recordings yet");
        return Ok(());
    }

    // Links are a nicety; list the notes even if the config call fails.
    let display = client.display_config().await.unwrap_or_default();
    for (i, note) in notes.iter().enumerate() {
        println!("{}", note_line(i + 1, note));
        if let Some(uri) = obsidian_uri(&display, &note.filename) {
            println!("    {uri}");
        }
    }
    Ok(())
}
