//! Target store (article master) repository

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for counts and LIMIT

use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{
    ArticleFields, ArticleRecord, Part, SnapshotRow, SyncHistoryEntry, SyncResult, SyncStatus,
};
use crate::util::unix_millis_now;

/// Read/write contract of the article master.
///
/// Every operation is synchronous and committed on its own; callers get no
/// transaction spanning several calls.
pub trait TargetStore {
    /// Whether a row exists for the article number
    fn article_exists(&self, article_number: &str) -> Result<bool>;

    /// Insert a new row for the part, tagged with `version`
    fn insert_article(&self, part: &Part, version: &str) -> Result<()>;

    /// Overwrite the mutable fields of an existing row, tagged with `version`
    fn update_article(&self, part: &Part, version: &str) -> Result<()>;

    /// Fetch a single row
    fn get_article(&self, article_number: &str) -> Result<Option<ArticleRecord>>;

    /// All rows ordered by BOM level, then article number
    fn list_articles(&self) -> Result<Vec<ArticleRecord>>;

    /// Rows last written by the given sync version
    fn list_articles_by_version(&self, version: &str) -> Result<Vec<ArticleRecord>>;

    /// Append a snapshot set under `version`, all rows or none.
    ///
    /// Returns the number of rows written.
    fn insert_snapshot(
        &self,
        version: &str,
        rows: &[ArticleFields],
        captured_at: i64,
    ) -> Result<usize>;

    /// Snapshot rows captured under the given version, oldest first
    fn list_snapshot_rows(&self, version: &str) -> Result<Vec<SnapshotRow>>;

    /// Append a sync result to the history log, returning its row id
    fn insert_sync_history(&self, result: &SyncResult) -> Result<i64>;

    /// Most recent history entries, newest first
    fn list_sync_history(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>>;

    /// Delete every article row, returning how many were removed
    fn clear_articles(&self) -> Result<usize>;
}

const ARTICLE_COLUMNS: &str = "article_number, description, category, unit_of_measure, \
     stock_quantity, unit_price, is_assembly, parent_assembly, bom_level, supplier, \
     bom_version, created_at, updated_at";

/// `SQLite` implementation of `TargetStore`
pub struct SqliteTargetStore {
    db: Database,
}

impl SqliteTargetStore {
    /// Wrap an opened (and migrated) database
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Access the underlying database
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Release the connection
    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    /// Parse an article from a row selected with `ARTICLE_COLUMNS`
    fn parse_article(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
        Ok(ArticleRecord {
            article_number: row.get(0)?,
            description: row.get(1)?,
            category: row.get(2)?,
            unit_of_measure: row.get(3)?,
            stock_quantity: row.get(4)?,
            unit_price: row.get(5)?,
            is_assembly: row.get::<_, i32>(6)? != 0,
            parent_assembly: row.get(7)?,
            bom_level: row.get(8)?,
            supplier: row.get(9)?,
            bom_version: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn parse_snapshot(row: &Row<'_>) -> rusqlite::Result<SnapshotRow> {
        Ok(SnapshotRow {
            id: row.get(0)?,
            bom_version: row.get(1)?,
            fields: ArticleFields {
                article_number: row.get(2)?,
                description: row.get(3)?,
                unit_price: row.get(4)?,
                bom_level: row.get(5)?,
            },
            snapshot_timestamp: row.get(6)?,
        })
    }

    fn query_articles(&self, sql: &str, version: Option<&str>) -> Result<Vec<ArticleRecord>> {
        let mut stmt = self.db.connection().prepare(sql)?;
        let rows = match version {
            Some(version) => stmt.query_map(params![version], Self::parse_article)?,
            None => stmt.query_map([], Self::parse_article)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl TargetStore for SqliteTargetStore {
    fn article_exists(&self, article_number: &str) -> Result<bool> {
        let found = self
            .db
            .connection()
            .query_row(
                "SELECT 1 FROM article_master WHERE article_number = ?",
                params![article_number],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_article(&self, part: &Part, version: &str) -> Result<()> {
        let now = unix_millis_now();
        self.db.connection().execute(
            "INSERT INTO article_master (
                article_number, description, category, unit_price, is_assembly,
                parent_assembly, bom_level, supplier, bom_version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                part.part_number,
                part.description,
                part.category,
                part.unit_price,
                i32::from(part.is_assembly),
                part.parent_assembly,
                part.bom_level,
                part.supplier,
                version,
                now,
                now
            ],
        )?;
        Ok(())
    }

    fn update_article(&self, part: &Part, version: &str) -> Result<()> {
        let now = unix_millis_now();
        let rows = self.db.connection().execute(
            "UPDATE article_master SET
                description = ?,
                category = ?,
                unit_price = ?,
                is_assembly = ?,
                parent_assembly = ?,
                bom_level = ?,
                supplier = ?,
                bom_version = ?,
                updated_at = ?
            WHERE article_number = ?",
            params![
                part.description,
                part.category,
                part.unit_price,
                i32::from(part.is_assembly),
                part.parent_assembly,
                part.bom_level,
                part.supplier,
                version,
                now,
                part.part_number
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(part.part_number.clone()));
        }
        Ok(())
    }

    fn get_article(&self, article_number: &str) -> Result<Option<ArticleRecord>> {
        let article = self
            .db
            .connection()
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM article_master WHERE article_number = ?"),
                params![article_number],
                Self::parse_article,
            )
            .optional()?;
        Ok(article)
    }

    fn list_articles(&self) -> Result<Vec<ArticleRecord>> {
        self.query_articles(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM article_master ORDER BY bom_level, article_number"
            ),
            None,
        )
    }

    fn list_articles_by_version(&self, version: &str) -> Result<Vec<ArticleRecord>> {
        self.query_articles(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM article_master
                 WHERE bom_version = ?
                 ORDER BY bom_level, article_number"
            ),
            Some(version),
        )
    }

    fn insert_snapshot(
        &self,
        version: &str,
        rows: &[ArticleFields],
        captured_at: i64,
    ) -> Result<usize> {
        let tx = self.db.connection().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO bom_snapshots (
                    bom_version, article_number, description, unit_price, bom_level, snapshot_timestamp
                ) VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for fields in rows {
                stmt.execute(params![
                    version,
                    fields.article_number,
                    fields.description,
                    fields.unit_price,
                    fields.bom_level,
                    captured_at
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn list_snapshot_rows(&self, version: &str) -> Result<Vec<SnapshotRow>> {
        let mut stmt = self.db.connection().prepare(
            "SELECT id, bom_version, article_number, description, unit_price, bom_level, snapshot_timestamp
             FROM bom_snapshots
             WHERE bom_version = ?
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![version], Self::parse_snapshot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn insert_sync_history(&self, result: &SyncResult) -> Result<i64> {
        let messages = serde_json::to_string(&result.error_messages)?;
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO sync_history (
                bom_version, total_parts, inserted, updated, errors,
                duration_seconds, status, sync_timestamp, error_messages
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                result.version,
                result.total_parts as i64,
                result.inserted as i64,
                result.updated as i64,
                result.errors as i64,
                result.duration_seconds,
                result.status.as_str(),
                result.timestamp.to_rfc3339(),
                messages
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_sync_history(&self, limit: usize) -> Result<Vec<SyncHistoryEntry>> {
        let mut stmt = self.db.connection().prepare(
            "SELECT id, bom_version, total_parts, inserted, updated, errors,
                    duration_seconds, status, sync_timestamp, error_messages
             FROM sync_history
             ORDER BY id DESC
             LIMIT ?",
        )?;

        let raw = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    SyncHistoryEntry {
                        id: row.get(0)?,
                        bom_version: row.get(1)?,
                        total_parts: row.get(2)?,
                        inserted: row.get(3)?,
                        updated: row.get(4)?,
                        errors: row.get(5)?,
                        error_messages: Vec::new(),
                        duration_seconds: row.get(6)?,
                        status: SyncStatus::Pending,
                        sync_timestamp: row.get(8)?,
                    },
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(9)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        raw.into_iter()
            .map(|(mut entry, status, messages)| -> Result<SyncHistoryEntry> {
                entry.status = status.parse()?;
                entry.error_messages = serde_json::from_str(&messages)?;
                Ok(entry)
            })
            .collect()
    }

    fn clear_articles(&self) -> Result<usize> {
        let removed = self.db.connection().execute("DELETE FROM article_master", [])?;
        tracing::info!("Cleared {removed} articles from article master");
        Ok(removed)
    }
}
