//! bomsync-core - Core library for bomsync
//!
//! This crate contains the BOM models, the extract/transform/load pipeline,
//! the version snapshot/diff engine, and the article master storage layer
//! used by the bomsync service.

pub mod db;
pub mod error;
pub mod etl;
pub mod models;
pub mod services;
pub mod snapshot;
pub mod source;
pub mod util;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{ArticleRecord, Part, SyncResult, SyncStatus};
pub use services::EtlService;
