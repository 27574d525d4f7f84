//! Persisted sign-in session
//!
//! The signed-in account (and its backend token, when one was issued) is
//! kept as JSON in the data directory so the user stays logged in between
//! invocations. Writes are atomic (temp file, then rename) so a crash never
//! leaves a half-written session behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use subtrack_core::{Config, User};

/// A persisted sign-in session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    /// Bearer token for the REST backend, when one was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    pub fn new(user: &User, token: Option<String>) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            token,
        }
    }

    pub fn user(&self) -> User {
        User {
            uid: self.uid.clone(),
            email: self.email.clone(),
        }
    }
}

/// Loads and saves the session file
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.session_path(),
        }
    }

    /// Load the persisted session
    ///
    /// Returns `None` when no session file exists (signed out).
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {:?}", self.path))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("Invalid session file {:?}", self.path))?;
        Ok(Some(session))
    }

    /// Save the session using an atomic write
    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
        atomic_write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to save session to {:?}", self.path))
    }

    /// Delete the persisted session (logout)
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete session {:?}", self.path))?;
        }
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    // Create temp file in the same directory (for atomic rename)
    let temp_path = path.with_extension("tmp");

    // Write to temp file
    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;

    // Sync to disk before rename
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    // Atomic rename
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}
