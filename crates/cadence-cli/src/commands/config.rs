//! Config command handlers

use anyhow::{bail, Context, Result};

use cadence_core::Config;

use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;

/// Dispatch a config subcommand; no subcommand shows the current values
pub fn handle(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => show(output),
        Some(ConfigCommands::Set { key, value }) => set(key, value, output),
    }
}

/// Show current configuration
fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir: {}", config.data_dir.display());
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        _ => {
            bail!("Unknown configuration key: '{}'\nValid keys: data_dir", key);
        }
    }

    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
