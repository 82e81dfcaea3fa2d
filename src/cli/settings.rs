use anyhow::{anyhow, Context, Result};

use super::args::{SettingsCliArgs, SettingsCommand};
use super::connect;
use crate::app::commands::parse_assignments;
use crate::app::render::{settings_lines, setup_lines};
use crate::backend::BackendApi;

pub async fn handle_settings_command(args: SettingsCliArgs) -> Result<()> {
    let client = connect()?;

    match args.command {
        SettingsCommand::Show => {
            let settings = client.settings().await.context("Failed to load settings")?;
            for line in settings_lines(&settings) {
                println!("{line}");
            }

            let setup = client
                .setup_status()
                .await
                .context("Failed to load setup status")?;
            println!();
            for line in setup_lines(&setup) {
                println!("{line}");
            }
            if !setup.ready {
                println!("\nSetup incomplete. Recording stays disabled until it is done.");
            }
        }
        SettingsCommand::Set { assignments } => {
            let values = parse_assignments(assignments.iter().map(String::as_str))?;
            client
                .update_settings(&values)
                .await
                .context("Failed to save settings")?;
            println!("Saved {} setting(s).", values.len());
        }
        SettingsCommand::Credentials { file } => {
            let result = client
                .upload_credentials(&file)
                .await
                .context("Upload failed")?;
            if !result.is_ok() {
                return Err(anyhow!(
                    "{}",
                    result.message.unwrap_or_else(|| "Upload failed".to_string())
                ));
            }
            println!("credentials.json uploaded");
        }
    }

    Ok(())
}
