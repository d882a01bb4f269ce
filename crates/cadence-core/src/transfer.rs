//! Data import/export and store statistics
//!
//! The export document is a single JSON object carrying all three
//! collections plus an export timestamp and a format version tag. Import
//! accepts exactly that shape and rejects documents missing any of the
//! collection keys before touching the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::models::{Completion, Habit, UserPreferences};

/// Format version written into every export
pub const EXPORT_VERSION: &str = "1.0.0";

/// Top-level keys an import document must carry
const REQUIRED_KEYS: [&str; 3] = ["habits", "completions", "preferences"];

/// A full snapshot of the three collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub habits: Vec<Habit>,
    pub completions: Vec<Completion>,
    pub preferences: Vec<UserPreferences>,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

impl ExportDocument {
    /// Snapshot the given collections with the current timestamp
    pub fn new(
        habits: Vec<Habit>,
        completions: Vec<Completion>,
        preferences: Vec<UserPreferences>,
    ) -> Self {
        Self {
            habits,
            completions,
            preferences,
            exported_at: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse and shape-check an import document
///
/// The top level must be an object carrying all three collection keys;
/// anything else fails with `InvalidFormat` before any state is touched.
/// Entity contents are not revalidated beyond deserialization.
pub fn parse_import(json: &str) -> StoreResult<ExportDocument> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        StoreError::InvalidFormat {
            reason: format!("not valid JSON: {}", e),
        }
    })?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .filter(|key| value.get(**key).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::InvalidFormat {
            reason: format!("missing required keys: {}", missing.join(", ")),
        });
    }

    serde_json::from_value(value).map_err(|e| StoreError::InvalidFormat {
        reason: e.to_string(),
    })
}

/// Counts of what an import replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub habits: usize,
    pub completions: usize,
    pub preferences: usize,
}

/// Collection counts and best-effort storage figures
///
/// Storage fields are `None` when the hosting environment cannot supply
/// them; computing stats never fails on their account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub habit_count: i64,
    pub completion_count: i64,
    pub preference_count: i64,
    pub total_records: i64,
    pub storage_used: Option<u64>,
    pub storage_quota: Option<u64>,
    pub last_updated: DateTime<Utc>,
}
