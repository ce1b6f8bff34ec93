//! Sync orchestration: extract → transform → load → log

use std::fmt;
use std::time::Instant;

use super::{extract, load, transform};
use crate::db::TargetStore;
use crate::error::Result;
use crate::models::{SyncCounts, SyncResult, SyncStatus};
use crate::source::SourceStore;

/// Phases a sync run moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    NotStarted,
    Extracting,
    Transforming,
    Loading,
    Logging,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl SyncPhase {
    const fn terminal(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Completed => Self::Completed,
            SyncStatus::CompletedWithErrors => Self::CompletedWithErrors,
            SyncStatus::Failed => Self::Failed,
            SyncStatus::Pending => Self::NotStarted,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Loading => "loading",
            Self::Logging => "logging",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sync attempt against a source and a target store.
///
/// [`SyncRun::execute`] never fails: an aborted run still yields a
/// [`SyncResult`] with status `failed`.
pub struct SyncRun<'a, S, T> {
    source: &'a S,
    target: &'a T,
    version: String,
    phase: SyncPhase,
}

impl<'a, S: SourceStore, T: TargetStore> SyncRun<'a, S, T> {
    pub fn new(source: &'a S, target: &'a T, version: impl Into<String>) -> Self {
        Self {
            source,
            target,
            version: version.into(),
            phase: SyncPhase::NotStarted,
        }
    }

    /// Current phase
    pub const fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// Run every phase and record the outcome in the sync history.
    pub fn execute(mut self) -> SyncResult {
        let started = Instant::now();
        tracing::info!("SYNC STARTED: {} (source -> article master)", self.version);

        let result = match self.run_phases() {
            Ok(counts) => SyncResult::finished(self.version.clone(), counts, started.elapsed()),
            Err(error) => {
                tracing::error!("SYNC FAILED during {}: {error}", self.phase);
                SyncResult::failed(error.to_string(), started.elapsed())
            }
        };

        self.enter(SyncPhase::Logging);
        match self.target.insert_sync_history(&result) {
            Ok(id) => tracing::info!("Sync result logged for version {} (#{id})", result.version),
            Err(error) => tracing::warn!(
                "Could not record sync history for version {}: {error}",
                result.version
            ),
        }

        self.enter(SyncPhase::terminal(result.status));
        tracing::info!(
            "SYNC {}: total={} inserted={} updated={} errors={} duration={:.3}s",
            result.status,
            result.total_parts,
            result.inserted,
            result.updated,
            result.errors,
            result.duration_seconds
        );
        result
    }

    fn run_phases(&mut self) -> Result<SyncCounts> {
        self.enter(SyncPhase::Extracting);
        let parts = extract(self.source)?;
        let total_parts = parts.len();

        self.enter(SyncPhase::Transforming);
        let validation = transform(parts);

        self.enter(SyncPhase::Loading);
        let outcome = load(self.target, &validation.valid, &self.version);

        Ok(SyncCounts {
            total_parts,
            inserted: outcome.inserted,
            updated: outcome.updated,
            validation_errors: validation.errors,
            load_errors: outcome.failures,
        })
    }

    fn enter(&mut self, next: SyncPhase) {
        tracing::debug!("sync {}: {} -> {}", self.version, self.phase, next);
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteTargetStore;
    use crate::models::FAILED_VERSION;
    use crate::source::{AssemblyRecord, StaticSource};
    use crate::test_support::{
        set_component_price, single_assembly_source, FlakyStore, UnreachableSource,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn end_to_end_sync_into_empty_target() {
        let source = single_assembly_source();
        let target = SqliteTargetStore::open_in_memory().unwrap();

        let result = SyncRun::new(&source, &target, "SYNC-1").execute();

        assert_eq!(result.version, "SYNC-1");
        assert_eq!(result.total_parts, 3);
        assert_eq!(result.inserted, 3);
        assert_eq!(result.updated, 0);
        assert_eq!(result.errors, 0);
        assert_eq!(result.status, SyncStatus::Completed);

        let root = target.get_article("ASM-1").unwrap().unwrap();
        assert!((root.unit_price - 25.0).abs() < f64::EPSILON);
        assert!(root.is_assembly);
        assert_eq!(root.parent_assembly, None);
        let leaf = target.get_article("PRT-002").unwrap().unwrap();
        assert_eq!(leaf.parent_assembly.as_deref(), Some("ASM-1"));
        assert_eq!(leaf.bom_level, 1);
    }

    #[test]
    fn second_sync_updates_every_part() {
        let source = single_assembly_source();
        let target = SqliteTargetStore::open_in_memory().unwrap();

        let first = SyncRun::new(&source, &target, "SYNC-1").execute();
        let second = SyncRun::new(&source, &target, "SYNC-2").execute();

        assert_eq!((first.inserted, first.updated), (3, 0));
        assert_eq!((second.inserted, second.updated), (0, 3));
        assert_eq!(target.list_articles_by_version("SYNC-2").unwrap().len(), 3);
    }

    #[test]
    fn negative_price_is_reported_and_skipped() {
        let mut source = single_assembly_source();
        let target = SqliteTargetStore::open_in_memory().unwrap();
        SyncRun::new(&source, &target, "SYNC-1").execute();

        set_component_price(&mut source, "PRT-002", -1.0);
        let result = SyncRun::new(&source, &target, "SYNC-2").execute();

        assert_eq!(result.total_parts, 3);
        assert_eq!(result.inserted + result.updated, 2);
        assert_eq!(result.errors, 1);
        assert!(result.error_messages[0].starts_with("PRT-002: Negative price"));
        assert_eq!(result.status, SyncStatus::CompletedWithErrors);

        // the rejected part keeps the previous version's data
        let stale = target.get_article("PRT-002").unwrap().unwrap();
        assert_eq!(stale.bom_version.as_deref(), Some("SYNC-1"));
    }

    #[test]
    fn extract_failure_synthesizes_failed_result() {
        let target = SqliteTargetStore::open_in_memory().unwrap();

        let result = SyncRun::new(&UnreachableSource, &target, "SYNC-1").execute();

        assert_eq!(result.version, FAILED_VERSION);
        assert_eq!(result.total_parts, 0);
        assert_eq!(result.errors, 1);
        assert!(result.error_messages[0].contains("connection refused"));
        assert_eq!(result.status, SyncStatus::Failed);

        let history = target.list_sync_history(10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, SyncStatus::Failed);
    }

    #[test]
    fn deep_assembly_chain_fails_the_run() {
        let source = (0..5_000).fold(StaticSource::new(), |source, i| {
            source.with_assembly(AssemblyRecord {
                id: i.to_string(),
                part_number: format!("ASM-{i}"),
                description: Some("Nested assembly".to_string()),
                category: None,
                quantity: 1,
                bom_level: i,
                parent_assembly_id: (i > 0).then(|| (i - 1).to_string()),
            })
        });
        let target = SqliteTargetStore::open_in_memory().unwrap();

        let result = SyncRun::new(&source, &target, "SYNC-1").execute();

        assert_eq!(result.status, SyncStatus::Failed);
        assert!(result.error_messages[0].contains("deeper than"));
        assert!(target.list_articles().unwrap().is_empty());
    }

    #[test]
    fn load_failures_are_counted_without_aborting() {
        let source = single_assembly_source();
        let target = FlakyStore::rejecting(&["PRT-001"]);

        let result = SyncRun::new(&source, &target, "SYNC-1").execute();

        assert_eq!(result.inserted, 2);
        assert_eq!(result.errors, 1);
        assert!(result.error_messages[0].starts_with("PRT-001: load failed"));
        assert_eq!(result.status, SyncStatus::CompletedWithErrors);
    }

    #[test]
    fn history_write_failure_keeps_result() {
        let source = single_assembly_source();
        let mut target = FlakyStore::rejecting(&[]);
        target.refuse_history = true;

        let result = SyncRun::new(&source, &target, "SYNC-1").execute();

        assert_eq!(result.status, SyncStatus::Completed);
        assert_eq!(result.inserted, 3);
        assert!(target.list_sync_history(10).unwrap().is_empty());
    }

    #[test]
    fn successful_run_is_logged_to_history() {
        let source = single_assembly_source();
        let target = SqliteTargetStore::open_in_memory().unwrap();

        let result = SyncRun::new(&source, &target, "SYNC-9").execute();

        let history = target.list_sync_history(1).unwrap();
        assert_eq!(history[0].bom_version, "SYNC-9");
        assert_eq!(history[0].inserted, 3);
        assert_eq!(history[0].status, result.status);
    }

    #[test]
    fn new_run_starts_not_started() {
        let source = single_assembly_source();
        let target = SqliteTargetStore::open_in_memory().unwrap();
        let run = SyncRun::new(&source, &target, "SYNC-1");
        assert_eq!(run.phase(), SyncPhase::NotStarted);
        assert_eq!(SyncPhase::CompletedWithErrors.to_string(), "completed_with_errors");
    }
}
