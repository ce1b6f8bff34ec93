//! Version snapshots and point-in-time comparison
//!
//! A snapshot copies the comparison fields of every current article under a
//! version label. Comparing an old label against a newer sync version reads
//! the old snapshot set and the articles currently tagged with the new
//! version, keyed by article number.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::TargetStore;
use crate::error::Result;
use crate::models::ArticleFields;
use crate::util::unix_millis_now;

/// Both sides of an article whose compared fields changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedArticle {
    pub article_number: String,
    pub old: ArticleFields,
    pub new: ArticleFields,
}

/// Delta between two versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub old_version: String,
    pub new_version: String,
    pub added: Vec<ArticleFields>,
    pub removed: Vec<ArticleFields>,
    pub modified: Vec<ModifiedArticle>,
    /// Articles present on both sides with identical fields
    pub unchanged: usize,
    pub total_changes: usize,
}

/// Result of [`diff`] before the version labels are attached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub added: Vec<ArticleFields>,
    pub removed: Vec<ArticleFields>,
    pub modified: Vec<ModifiedArticle>,
    pub unchanged: usize,
}

/// Copy every current article's comparison fields under `version`.
///
/// Never replaces earlier snapshots, even of the same version. The set is
/// written atomically, so a failed capture leaves nothing under `version`.
/// Returns the number of rows captured.
pub fn capture(store: &impl TargetStore, version: &str) -> Result<usize> {
    let captured_at = unix_millis_now();
    let rows: Vec<ArticleFields> = store
        .list_articles()?
        .iter()
        .map(crate::models::ArticleRecord::comparison_fields)
        .collect();
    let captured = store.insert_snapshot(version, &rows, captured_at)?;
    tracing::info!("Saved snapshot of {captured} articles for version {version}");
    Ok(captured)
}

/// Compare the snapshot of `old_version` with the articles currently tagged
/// `new_version`.
pub fn compare(
    store: &impl TargetStore,
    old_version: &str,
    new_version: &str,
) -> Result<VersionComparison> {
    let old = store
        .list_snapshot_rows(old_version)?
        .into_iter()
        .map(|row| row.fields);
    let new = store
        .list_articles_by_version(new_version)?
        .iter()
        .map(crate::models::ArticleRecord::comparison_fields)
        .collect::<Vec<_>>();

    let delta = diff(old, new);
    let total_changes = delta.added.len() + delta.removed.len() + delta.modified.len();
    tracing::info!(
        "Compared {old_version} -> {new_version}: {} added, {} removed, {} modified",
        delta.added.len(),
        delta.removed.len(),
        delta.modified.len()
    );

    Ok(VersionComparison {
        old_version: old_version.to_string(),
        new_version: new_version.to_string(),
        added: delta.added,
        removed: delta.removed,
        modified: delta.modified,
        unchanged: delta.unchanged,
        total_changes,
    })
}

/// Key-wise difference of two article sets.
///
/// Later duplicates of a key replace earlier ones on each side. Results are
/// ordered by article number.
pub fn diff(
    old: impl IntoIterator<Item = ArticleFields>,
    new: impl IntoIterator<Item = ArticleFields>,
) -> Delta {
    let mut old: BTreeMap<String, ArticleFields> = old
        .into_iter()
        .map(|fields| (fields.article_number.clone(), fields))
        .collect();
    let new: BTreeMap<String, ArticleFields> = new
        .into_iter()
        .map(|fields| (fields.article_number.clone(), fields))
        .collect();

    let mut delta = Delta::default();
    for (key, new_fields) in new {
        match old.remove(&key) {
            None => delta.added.push(new_fields),
            Some(old_fields) if old_fields == new_fields => delta.unchanged += 1,
            Some(old_fields) => delta.modified.push(ModifiedArticle {
                article_number: key,
                old: old_fields,
                new: new_fields,
            }),
        }
    }
    delta.removed = old.into_values().collect();
    delta
}
