//! Sync version tags

use chrono::{DateTime, Utc};

/// `SYNC-<epoch seconds>` for the given start time
pub fn version_tag(started_at: DateTime<Utc>) -> String {
    format!("SYNC-{}", started_at.timestamp())
}

/// Hands out version tags that stay unique within one process.
///
/// A second tag requested within the same second as the previous one gets a
/// `-<n>` suffix. Clock steps backwards keep the suffix counting from the
/// last issued second so tags never repeat.
#[derive(Debug, Default)]
pub struct VersionGenerator {
    last: Option<(i64, u32)>,
}

impl VersionGenerator {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub fn next(&mut self, started_at: DateTime<Utc>) -> String {
        let seconds = started_at.timestamp();
        match self.last {
            Some((last, count)) if seconds <= last => {
                let count = count + 1;
                self.last = Some((last, count));
                format!("SYNC-{last}-{count}")
            }
            _ => {
                self.last = Some((seconds, 0));
                version_tag(started_at)
            }
        }
    }
}
