//! Database connection management

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::migrations;
use crate::error::{Error, Result};

/// Owned `SQLite` connection for the article master.
///
/// The connection lives as long as this value and is closed on drop (or
/// explicitly through [`Database::close`]).
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open a database at the given path, creating it (and its parent
    /// directory) if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let database = Self {
            conn,
            path: Some(path),
        };
        database.configure()?;
        database.migrate()?;
        tracing::info!(
            "Article master database initialized: {}",
            database.path.as_deref().map_or_else(String::new, |p| p.display().to_string())
        );
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let database = Self { conn, path: None };
        database.configure()?;
        database.migrate()?;
        Ok(database)
    }

    /// Configure `SQLite` pragmas
    fn configure(&self) -> Result<()> {
        // In-memory databases report "memory" and ignore the request
        match self
            .conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
        {
            Ok(mode) if mode.eq_ignore_ascii_case("wal") || self.path.is_none() => {}
            Ok(mode) => tracing::warn!("WAL journal mode unavailable, using {mode}"),
            Err(error) => tracing::warn!("Failed to enable WAL journal mode: {error}"),
        }
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn)
    }

    /// Filesystem path, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, surfacing any error instead of ignoring it on drop
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, error)| Error::from(error))
    }
}
