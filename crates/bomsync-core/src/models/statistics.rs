//! Aggregate BOM statistics

use serde::{Deserialize, Serialize};

use super::Part;
use crate::util::round_to;

/// Summary counts over a BOM forest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BomStatistics {
    /// Every node in the forest
    pub total_parts: usize,
    /// Internal nodes
    pub assemblies: usize,
    /// Leaf nodes
    pub components: usize,
    /// Sum of `unit_price * quantity` over leaf components, rounded to cents
    pub total_cost: f64,
    /// Deepest level reached, root = 0
    pub max_depth: usize,
}

impl BomStatistics {
    /// Compute statistics for a forest of root assemblies.
    #[must_use]
    pub fn from_forest(forest: &[Part]) -> Self {
        let mut stats = Self::default();
        let mut stack: Vec<(&Part, usize)> = forest.iter().map(|root| (root, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            stats.total_parts += 1;
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_assembly {
                stats.assemblies += 1;
            } else {
                stats.components += 1;
                stats.total_cost += node.extended_price();
            }
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }

        stats.total_cost = round_to(stats.total_cost, 2);
        stats
    }
}
