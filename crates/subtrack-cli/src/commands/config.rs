//! Config command handlers

use anyhow::{bail, Context, Result};

use subtrack_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "api_url": config.api_url,
                    "stale_after_secs": config.stale_after_secs
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:         {}", config.data_dir.display());
            println!("  api_url:          {}", config.api_url);
            println!("  stale_after_secs: {}", config.stale_after_secs);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    match key.as_str() {
        "data_dir" => {
            config.data_dir = value.clone().into();
        }
        "api_url" => {
            config.api_url = value.clone();
        }
        "stale_after_secs" => {
            config.stale_after_secs = value
                .parse()
                .with_context(|| format!("Invalid number of seconds: {}", value))?;
        }
        other => {
            bail!(
                "Unknown configuration key: {}. Valid keys: data_dir, api_url, stale_after_secs",
                other
            );
        }
    }

    config.save().context("Failed to save configuration")?;
    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
