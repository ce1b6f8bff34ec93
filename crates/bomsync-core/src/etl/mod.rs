//! Extract / transform / load pipeline
//!
//! `extract` builds the BOM forest from the source store and flattens it,
//! `validate` splits the flat list into loadable parts and error messages,
//! `load` upserts the survivors into the article master, and `pipeline`
//! drives the three phases and produces the audit record.

mod flatten;
mod load;
mod pipeline;
mod tree;
mod validate;
mod version;

pub use flatten::flatten;
pub use load::{load, LoadOutcome};
pub use pipeline::{SyncPhase, SyncRun};
pub use tree::{build_bom_tree, build_forest, MAX_ASSEMBLY_DEPTH};
pub use validate::{transform, validate_part, Validation};
pub use version::{version_tag, VersionGenerator};

use crate::error::Result;
use crate::models::Part;
use crate::source::SourceStore;

/// Build the source tree and flatten it into pre-order
pub fn extract(source: &impl SourceStore) -> Result<Vec<Part>> {
    tracing::info!("EXTRACT: Fetching BOM from source...");
    let forest = build_bom_tree(source)?;
    let parts = flatten(forest);
    tracing::info!("EXTRACT: Retrieved {} parts", parts.len());
    Ok(parts)
}
