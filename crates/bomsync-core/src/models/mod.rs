//! Data models for bomsync

mod article;
mod part;
mod statistics;
mod sync_result;

pub use article::{ArticleFields, ArticleRecord, SnapshotRow};
pub use part::Part;
pub use statistics::BomStatistics;
pub use sync_result::{SyncCounts, SyncHistoryEntry, SyncResult, SyncStatus, FAILED_VERSION};
