//! Article master and snapshot rows

use serde::{Deserialize, Serialize};

/// One row of the target article master, keyed by article (part) number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Business key, same as the BOM part number
    pub article_number: String,
    pub description: String,
    pub category: Option<String>,
    /// Unit of measure, `EA` unless changed in the ERP
    pub unit_of_measure: String,
    /// Stock on hand, owned by the ERP and never written by a sync
    pub stock_quantity: i64,
    pub unit_price: f64,
    pub is_assembly: bool,
    pub parent_assembly: Option<String>,
    pub bom_level: i64,
    pub supplier: Option<String>,
    /// Version tag of the sync that last wrote this row
    pub bom_version: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl ArticleRecord {
    /// The fields compared between versions
    #[must_use]
    pub fn comparison_fields(&self) -> ArticleFields {
        ArticleFields {
            article_number: self.article_number.clone(),
            description: self.description.clone(),
            unit_price: self.unit_price,
            bom_level: self.bom_level,
        }
    }
}

/// Comparison-relevant subset of an article.
///
/// Equality is strict, including the float price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleFields {
    pub article_number: String,
    pub description: String,
    pub unit_price: f64,
    pub bom_level: i64,
}

/// A point-in-time copy of an article's comparison fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: i64,
    /// Version label the snapshot was captured under
    pub bom_version: String,
    #[serde(flatten)]
    pub fields: ArticleFields,
    /// Capture timestamp (Unix ms)
    pub snapshot_timestamp: i64,
}
