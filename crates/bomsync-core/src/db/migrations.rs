//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        apply(conn, 1, MIGRATION_V1)?;
    }
    if version < 2 {
        apply(conn, 2, MIGRATION_V2)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Version 1: article master, sync history and snapshot tables
const MIGRATION_V1: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    )",
    // Mirrors the ERP item master (CI_Item)
    "CREATE TABLE IF NOT EXISTS article_master (
        article_number TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        category TEXT,
        unit_of_measure TEXT NOT NULL DEFAULT 'EA',
        stock_quantity INTEGER NOT NULL DEFAULT 0,
        unit_price REAL NOT NULL DEFAULT 0,
        is_assembly INTEGER NOT NULL DEFAULT 0,
        parent_assembly TEXT,
        bom_level INTEGER NOT NULL DEFAULT 0,
        supplier TEXT,
        bom_version TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sync_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bom_version TEXT NOT NULL,
        total_parts INTEGER NOT NULL,
        inserted INTEGER NOT NULL,
        updated INTEGER NOT NULL,
        errors INTEGER NOT NULL,
        duration_seconds REAL NOT NULL,
        status TEXT NOT NULL,
        sync_timestamp TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS bom_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bom_version TEXT NOT NULL,
        article_number TEXT NOT NULL,
        description TEXT NOT NULL,
        unit_price REAL NOT NULL,
        bom_level INTEGER NOT NULL,
        snapshot_timestamp INTEGER NOT NULL
    )",
    "INSERT INTO schema_version (version) VALUES (1)",
];

/// Version 2: version lookups and persisted error messages
const MIGRATION_V2: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_article_master_version ON article_master(bom_version)",
    "CREATE INDEX IF NOT EXISTS idx_article_master_level ON article_master(bom_level, article_number)",
    "CREATE INDEX IF NOT EXISTS idx_bom_snapshots_version ON bom_snapshots(bom_version)",
    "ALTER TABLE sync_history ADD COLUMN error_messages TEXT NOT NULL DEFAULT '[]'",
    "INSERT INTO schema_version (version) VALUES (2)",
];

/// Apply one migration's statements inside a transaction
fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for stmt in statements {
        tx.execute(stmt, [])?;
    }
    tx.commit()?;

    tracing::info!("Migrated article master database to version {version}");
    Ok(())
}
