//! In-memory source store, loadable from a JSON fixture

use serde::{Deserialize, Serialize};

use super::{AssemblyRecord, ComponentRecord, SourceStore};
use crate::error::Result;

/// A fixed BOM dataset held in memory.
///
/// Used for offline runs and tests. The JSON form mirrors the two source
/// tables: `{"assemblies": [...], "components": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticSource {
    #[serde(default)]
    assemblies: Vec<AssemblyRecord>,
    #[serde(default)]
    components: Vec<ComponentRecord>,
}

impl StaticSource {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON fixture
    pub fn from_json(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Add an assembly row
    #[must_use]
    pub fn with_assembly(mut self, assembly: AssemblyRecord) -> Self {
        self.assemblies.push(assembly);
        self
    }

    /// Add a component row
    #[must_use]
    pub fn with_component(mut self, component: ComponentRecord) -> Self {
        self.components.push(component);
        self
    }

    /// Mutable access to component rows, e.g. to change prices between runs
    pub fn components_mut(&mut self) -> &mut Vec<ComponentRecord> {
        &mut self.components
    }
}

impl SourceStore for StaticSource {
    fn list_assemblies(&self) -> Result<Vec<AssemblyRecord>> {
        let mut assemblies = self.assemblies.clone();
        assemblies.sort_by_key(|assembly| assembly.bom_level);
        Ok(assemblies)
    }

    fn list_components(&self, assembly_id: &str) -> Result<Vec<ComponentRecord>> {
        Ok(self
            .components
            .iter()
            .filter(|component| component.assembly_id == assembly_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "assemblies": [
            {"id": 2, "part_number": "ASM-2", "description": "Sub frame", "bom_level": 1, "parent_assembly_id": 1},
            {"id": 1, "part_number": "ASM-1", "description": "Main frame", "bom_level": 0, "parent_assembly_id": null}
        ],
        "components": [
            {"id": 10, "assembly_id": 1, "part_number": "PRT-001", "description": "Bolt M8", "quantity": 4, "unit_price": 0.5, "supplier": "Acme"},
            {"id": 11, "assembly_id": 2, "part_number": "PRT-002", "description": "Plate 2mm", "unit_price": 12.0}
        ]
    }"#;

    #[test]
    fn from_json_loads_both_tables() {
        let source = StaticSource::from_json(FIXTURE).unwrap();

        let assemblies = source.list_assemblies().unwrap();
        assert_eq!(assemblies.len(), 2);
        assert_eq!(assemblies[0].part_number, "ASM-1");

        let components = source.list_components("1").unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].quantity, 4);
        assert!(source.list_components("99").unwrap().is_empty());
    }

    #[test]
    fn from_json_rejects_malformed_payload() {
        assert!(StaticSource::from_json("{\"assemblies\": 3}").is_err());
    }
}
