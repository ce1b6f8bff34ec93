//! Fixtures and doubles shared by unit tests

use crate::db::{SqliteTargetStore, TargetStore};
use crate::error::{Error, Result};
use crate::models::{ArticleFields, ArticleRecord, Part, SnapshotRow, SyncHistoryEntry, SyncResult};
use crate::source::{AssemblyRecord, ComponentRecord, SourceStore, StaticSource};

/// One root assembly `ASM-1` with `PRT-001` (10.0 x 2, supplied) and
/// `PRT-002` (5.0 x 1, no supplier).
pub fn single_assembly_source() -> StaticSource {
    StaticSource::new()
        .with_assembly(AssemblyRecord {
            id: "1".to_string(),
            part_number: "ASM-1".to_string(),
            description: Some("Main assembly".to_string()),
            category: Some("Assembly".to_string()),
            quantity: 1,
            bom_level: 0,
            parent_assembly_id: None,
        })
        .with_component(ComponentRecord {
            id: "10".to_string(),
            assembly_id: "1".to_string(),
            part_number: Some("PRT-001".to_string()),
            description: Some("Hex bolt M8".to_string()),
            quantity: 2,
            unit_price: Some(10.0),
            supplier: Some("Acme".to_string()),
        })
        .with_component(ComponentRecord {
            id: "11".to_string(),
            assembly_id: "1".to_string(),
            part_number: Some("PRT-002".to_string()),
            description: Some("Washer M8".to_string()),
            quantity: 1,
            unit_price: Some(5.0),
            supplier: None,
        })
}

/// Change the price of one component in a static source
pub fn set_component_price(source: &mut StaticSource, part_number: &str, price: f64) {
    for component in source.components_mut() {
        if component.part_number.as_deref() == Some(part_number) {
            component.unit_price = Some(price);
        }
    }
}

/// A source whose every read fails
pub struct UnreachableSource;

impl SourceStore for UnreachableSource {
    fn list_assemblies(&self) -> Result<Vec<AssemblyRecord>> {
        Err(Error::Source("connection refused".to_string()))
    }

    fn list_components(&self, _assembly_id: &str) -> Result<Vec<ComponentRecord>> {
        Err(Error::Source("connection refused".to_string()))
    }
}

/// Delegates to an in-memory store but refuses writes for chosen part numbers
pub struct FlakyStore {
    pub inner: SqliteTargetStore,
    pub reject: Vec<String>,
    pub refuse_history: bool,
}

impl FlakyStore {
    pub fn rejecting(part_numbers: &[&str]) -> Self {
        Self {
            inner: SqliteTargetStore::open_in_memory().unwrap(),
            reject: part_numbers.iter().map(|pn| (*pn).to_string()).collect(),
            refuse_history: false,
        }
    }

    fn check(&self, part: &Part) -> Result<()> {
        if self.reject.contains(&part.part_number) {
            Err(Error::Database(format!("write refused for {}", part.part_number)))
        } else {
            Ok(())
        }
    }
}

impl TargetStore for FlakyStore {
    fn article_exists(&self, article_number: &str) -> Result<bool> {
        self.inner.article_exists(article_number)
    }

    fn insert_article(&self, part: &Part, version: &str) -> Result<()> {
        self.check(part)?;
        self.inner.insert_article(part, version)
    }

    fn update_article(&self, part: &Part, version: &str) -> Result<()> {
        self.check(part)?;
        self.inner.update_article(part, version)
    }

    fn get_article(&self, article_number: &str) -> Result<Option<ArticleRecord>> {
        self.inner.get_article(article_number)
    }

    fn list_articles(&self) -> Result<Vec<ArticleRecord>> {
        self.inner.list_articles()
    }

    fn list_articles_by_version(&self, version: &str) -> Result<Vec<ArticleRecord>> {
        self.inner.list_articles_by_version(version)
    }

    fn insert_snapshot(
        &self,
        version: &str,
        rows: &[ArticleFields],
        captured_at: i64,
    ) -> Result<usize> {
        self.inner.insert_snapshot(version, rows, captured_at)
    }

    fn list_snapshot_rows(&self, version: &str) -> Result<Vec<SnapshotRow>> {
        self.inner.list_snapshot_rows(version)
    }

    fn insert_sync_history(&self, result: &SyncResult) -> Result<i64> {
        if self.refuse_history {
            return Err(Error::Database("history table is read-only".to_string()));
        }
        self.inner.insert_sync_history(result)
    }

    fn list_sync_history(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>> {
        self.inner.list_sync_history(limit)
    }

    fn clear_articles(&self) -> Result<usize> {
        self.inner.clear_articles()
    }
}
