//! Source store (hierarchical BOM system of record)

mod memory;
mod supabase;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

pub use memory::StaticSource;
pub use supabase::SupabaseSource;

/// Read-only contract of the BOM system of record
pub trait SourceStore {
    /// Every assembly row. Ordering by level is a courtesy, not relied upon.
    fn list_assemblies(&self) -> Result<Vec<AssemblyRecord>>;

    /// Leaf components belonging to one assembly
    fn list_components(&self, assembly_id: &str) -> Result<Vec<ComponentRecord>>;
}

/// Assembly row as stored in `bom_assemblies`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssemblyRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub part_number: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub bom_level: u32,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub parent_assembly_id: Option<String>,
}

/// Component row as stored in `bom_components`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ComponentRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub assembly_id: String,
    #[serde(default)]
    pub part_number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub supplier: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Source ids may be integers or strings (uuid); both are kept as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Int(id) => id.to_string(),
            RawId::Text(id) => id,
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
