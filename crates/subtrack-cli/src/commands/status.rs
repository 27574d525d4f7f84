//! Status command handler

use anyhow::Result;

use subtrack_core::Config;

use crate::output::{Output, OutputFormat};
use crate::session::SessionStore;

/// Show status information
pub fn show(config: &Config, sessions: &SessionStore, output: &Output) -> Result<()> {
    let session = sessions.load()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "signed_in": session.is_some(),
                    "user": session.as_ref().map(|s| serde_json::json!({
                        "uid": s.uid,
                        "email": s.email,
                    })),
                    "backend": {
                        "api_url": config.api_url,
                        "has_token": session.as_ref().map(|s| s.token.is_some()).unwrap_or(false)
                    },
                    "cache": {
                        "stale_after_secs": config.stale_after_secs
                    },
                    "data_dir": config.data_dir
                })
            );
        }
        OutputFormat::Quiet => {
            match &session {
                Some(s) => println!("{}", s.uid),
                None => println!("signed-out"),
            }
        }
        OutputFormat::Human => {
            println!("subtrack Status");
            println!("===============");
            println!();
            println!("Account:");
            match &session {
                Some(s) => {
                    println!("  Signed in as: {} ({})", s.email, s.uid);
                    println!(
                        "  Backend token: {}",
                        if s.token.is_some() { "present" } else { "none" }
                    );
                }
                None => println!("  Not signed in. Run `subtrack login` first."),
            }
            println!();
            println!("Backend:");
            println!("  API URL: {}", config.api_url);
            println!();
            println!("Cache:");
            println!("  Staleness window: {}s", config.stale_after_secs);
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
        }
    }

    Ok(())
}
