//! Session persistence
//!
//! Persists the lightweight slice of state that survives restarts outside
//! the database: preferences plus view state (selected date and view
//! mode). The bulk collections live in the database only, so there is a
//! single source of truth for them.
//!
//! Writes are atomic (temp file, then rename) so a crash mid-save never
//! leaves a torn file.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreResult;
use crate::models::UserPreferences;
use crate::state::ViewState;

/// The persisted session: preferences + view state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub preferences: UserPreferences,
    #[serde(flatten)]
    pub view: ViewState,
}

impl Session {
    /// Load the session from disk
    ///
    /// A missing file yields the default session. An unreadable or
    /// corrupt file is logged and also yields the default session rather
    /// than failing startup.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(session) => session,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt session file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable session file, using defaults");
                Self::default()
            }
        }
    }

    /// Save the session to disk atomically
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}
