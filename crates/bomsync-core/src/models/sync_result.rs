//! Sync audit records

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Error;
use crate::util::round_to;

/// Version label recorded for a sync that aborted before loading
pub const FAILED_VERSION: &str = "ERROR";

/// Terminal (or initial) status of a sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Not finished yet
    #[default]
    Pending,
    /// Every extracted part was loaded
    Completed,
    /// The pipeline ran to the end but some parts were rejected or failed to load
    CompletedWithErrors,
    /// The pipeline aborted
    Failed,
}

impl SyncStatus {
    /// Stable storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "completed_with_errors" => Ok(Self::CompletedWithErrors),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidInput(format!("unknown sync status '{other}'"))),
        }
    }
}

/// Outcome of one sync attempt.
///
/// Built once at the end of a run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub version: String,
    pub total_parts: usize,
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
    pub error_messages: Vec<String>,
    #[serde(serialize_with = "serialize_duration_secs")]
    pub duration_seconds: f64,
    pub timestamp: DateTime<Utc>,
    pub status: SyncStatus,
}

/// Counters collected by a pipeline run that reached the load phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub total_parts: usize,
    pub inserted: usize,
    pub updated: usize,
    pub validation_errors: Vec<String>,
    pub load_errors: Vec<String>,
}

impl SyncResult {
    /// Result for a run that went through every phase.
    ///
    /// Any rejected or failed record downgrades the status to
    /// `completed_with_errors`.
    #[must_use]
    pub fn finished(version: impl Into<String>, counts: SyncCounts, elapsed: Duration) -> Self {
        let SyncCounts {
            total_parts,
            inserted,
            updated,
            validation_errors,
            load_errors,
        } = counts;

        let mut error_messages = validation_errors;
        error_messages.extend(load_errors);
        let errors = error_messages.len();

        Self {
            version: version.into(),
            total_parts,
            inserted,
            updated,
            errors,
            error_messages,
            duration_seconds: elapsed.as_secs_f64(),
            timestamp: Utc::now(),
            status: if errors == 0 {
                SyncStatus::Completed
            } else {
                SyncStatus::CompletedWithErrors
            },
        }
    }

    /// Result synthesized when the pipeline aborts.
    #[must_use]
    pub fn failed(cause: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            version: FAILED_VERSION.to_string(),
            total_parts: 0,
            inserted: 0,
            updated: 0,
            errors: 1,
            error_messages: vec![cause.into()],
            duration_seconds: elapsed.as_secs_f64(),
            timestamp: Utc::now(),
            status: SyncStatus::Failed,
        }
    }
}

fn serialize_duration_secs<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}

/// A persisted sync result as read back from the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncHistoryEntry {
    pub id: i64,
    pub bom_version: String,
    pub total_parts: i64,
    pub inserted: i64,
    pub updated: i64,
    pub errors: i64,
    pub error_messages: Vec<String>,
    pub duration_seconds: f64,
    pub status: SyncStatus,
    pub sync_timestamp: String,
}
