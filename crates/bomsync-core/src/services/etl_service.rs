//! Owned ETL service: one source client, one target store, one version clock.

use std::path::Path;

use chrono::Utc;

use crate::db::{Database, SqliteTargetStore, TargetStore};
use crate::error::Result;
use crate::etl::{build_bom_tree, SyncRun, VersionGenerator};
use crate::models::{ArticleRecord, BomStatistics, Part, SyncHistoryEntry, SyncResult};
use crate::snapshot::{self, VersionComparison};
use crate::source::SourceStore;

/// Runs syncs and answers read queries for one source/target pair.
///
/// Not thread-safe on its own; hosts that share it across threads wrap it in
/// a mutex so syncs are serialized.
#[derive(Debug)]
pub struct EtlService<S, T = SqliteTargetStore> {
    source: S,
    target: T,
    versions: VersionGenerator,
}

impl<S: SourceStore> EtlService<S, SqliteTargetStore> {
    /// Open (and migrate) the article master at `db_path`.
    pub fn open(source: S, db_path: impl AsRef<Path>) -> Result<Self> {
        let target = SqliteTargetStore::new(Database::open(db_path)?);
        Ok(Self::new(source, target))
    }

    /// Release the article master connection.
    pub fn close(self) -> Result<()> {
        self.target.close()
    }
}

impl<S: SourceStore, T: TargetStore> EtlService<S, T> {
    pub fn new(source: S, target: T) -> Self {
        Self {
            source,
            target,
            versions: VersionGenerator::new(),
        }
    }

    /// Run a full extract -> transform -> load cycle.
    ///
    /// Never fails; faults are reported through the result's status.
    pub fn run_sync(&mut self) -> SyncResult {
        let version = self.versions.next(Utc::now());
        SyncRun::new(&self.source, &self.target, version).execute()
    }

    /// The BOM forest as currently stored in the source
    pub fn source_tree(&self) -> Result<Vec<Part>> {
        build_bom_tree(&self.source)
    }

    /// Every article in the target, ordered by level then article number
    pub fn target_articles(&self) -> Result<Vec<ArticleRecord>> {
        self.target.list_articles()
    }

    pub fn bom_statistics(&self) -> Result<BomStatistics> {
        let forest = self.source_tree()?;
        Ok(BomStatistics::from_forest(&forest))
    }

    /// Most recent sync history entries, newest first
    pub fn sync_history(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>> {
        self.target.list_sync_history(limit)
    }

    /// Delete every article. History and snapshots are kept.
    pub fn clear_target(&self) -> Result<usize> {
        let removed = self.target.clear_articles()?;
        tracing::warn!("Cleared {removed} articles from the article master");
        Ok(removed)
    }

    pub fn capture_snapshot(&self, version: &str) -> Result<usize> {
        snapshot::capture(&self.target, version)
    }

    pub fn compare_versions(&self, old_version: &str, new_version: &str) -> Result<VersionComparison> {
        snapshot::compare(&self.target, old_version, new_version)
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub const fn target(&self) -> &T {
        &self.target
    }
}
