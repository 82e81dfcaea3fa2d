//! Line commands understood by the interactive shell.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::backend::Settings;

pub const HELP: &str = "\
Commands:
  record            start or stop recording
  start | stop      start or stop explicitly
  pick              list upcoming meetings
  select <n>        choose meeting <n> from the list
  custom [title]    record under a custom title
  cancel            close the meeting list
  retry <id>        re-process a saved recording
  saved             list recordings that failed processing
  notes             list generated notes
  open <n>          print the Obsidian link for note <n>
  status            show the current state
  settings          show backend settings
  set KEY=VALUE...  update backend settings
  credentials <file>  upload Google credentials.json
  done              leave settings
  help              show this help
  quit              exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Record,
    Start,
    Stop,
    Pick,
    /// One-based position in the picker list.
    Select(usize),
    Custom(String),
    Cancel,
    Retry(String),
    Saved,
    Notes,
    /// One-based position in the notes list.
    Open(usize),
    Status,
    Settings,
    Set(Settings),
    Credentials(PathBuf),
    Done,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{0}' is not a list position")]
    InvalidPosition(String),
    #[error("Expected KEY=VALUE, got '{0}'")]
    InvalidAssignment(String),
}

impl FromStr for ShellCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(ParseError::Empty),
            "record" | "r" => ShellCommand::Record,
            "start" => ShellCommand::Start,
            "stop" => ShellCommand::Stop,
            "pick" | "change" => ShellCommand::Pick,
            "select" => ShellCommand::Select(position("select", rest)?),
            "custom" => ShellCommand::Custom(rest.to_string()),
            "cancel" => ShellCommand::Cancel,
            "retry" => ShellCommand::Retry(required("retry", "a recording id", rest)?.to_string()),
            "saved" => ShellCommand::Saved,
            "notes" => ShellCommand::Notes,
            "open" => ShellCommand::Open(position("open", rest)?),
            "status" => ShellCommand::Status,
            "settings" => ShellCommand::Settings,
            "set" => ShellCommand::Set(parse_assignments(rest.split_whitespace())?),
            "credentials" => ShellCommand::Credentials(PathBuf::from(required(
                "credentials",
                "a file path",
                rest,
            )?)),
            "done" => ShellCommand::Done,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn required<'a>(
    command: &'static str,
    argument: &'static str,
    rest: &'a str,
) -> Result<&'a str, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument { command, argument })
    } else {
        Ok(rest)
    }
}

fn position(command: &'static str, rest: &str) -> Result<usize, ParseError> {
    let raw = required(command, "a list position", rest)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ParseError::InvalidPosition(raw.to_string())),
    }
}

/// Turn `KEY=VALUE` words into a settings update. Values are sent as strings.
/// A word without a `KEY=` prefix continues the previous value, so
/// `NAME=My Vault` keeps its space.
pub fn parse_assignments<'a, I>(words: I) -> Result<Settings, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut settings = Settings::new();
    let mut current: Option<(String, String)> = None;
    for word in words {
        match split_assignment(word) {
            Some((key, value)) => {
                if let Some((key, value)) = current.take() {
                    settings.insert(key, serde_json::Value::String(value.trim().to_string()));
                }
                current = Some((key.to_string(), value.to_string()));
            }
            None => match current.as_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(word);
                }
                None => return Err(ParseError::InvalidAssignment(word.to_string())),
            },
        }
    }
    if let Some((key, value)) = current {
        settings.insert(key, serde_json::Value::String(value.trim().to_string()));
    }
    if settings.is_empty() {
        return Err(ParseError::MissingArgument {
            command: "set",
            argument: "at least one KEY=VALUE",
        });
    }
    Ok(settings)
}

fn split_assignment(word: &str) -> Option<(&str, &str)> {
    let (key, value) = word.trim().split_once('=')?;
    let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some((key, value))
}
