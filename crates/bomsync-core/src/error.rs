//! Error types for bomsync-core

use thiserror::Error;

/// Result type alias using bomsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in bomsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// HTTP transport error while talking to the source store
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Source store returned an error or malformed data
    #[error("Source error: {0}")]
    Source(String),

    /// An assembly references a parent assembly id that does not exist
    #[error("Assembly {part_number} references unknown parent assembly {parent_id}")]
    DanglingParent {
        /// Part number of the orphaned assembly
        part_number: String,
        /// The unresolved parent id
        parent_id: String,
    },

    /// Assemblies that cannot be reached from any root
    #[error("Assembly hierarchy contains a cycle through: {}", .0.join(", "))]
    AssemblyCycle(Vec<String>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
