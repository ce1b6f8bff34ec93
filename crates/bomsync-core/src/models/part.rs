//! BOM part model

use serde::{Deserialize, Serialize};

/// A node in the bill of materials.
///
/// Assemblies aggregate their children; components are purchasable leaves.
/// An assembly's `unit_price` is never read from the source: it is the sum of
/// `child.unit_price * child.quantity` over its children, filled in while the
/// tree is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Source-system identifier
    pub id: String,
    /// Business key, unique within a sync version
    pub part_number: String,
    /// Human readable description
    pub description: String,
    /// Optional category (assemblies only at the source)
    pub category: Option<String>,
    /// Multiplier relative to the parent assembly
    pub quantity: u32,
    /// Price per unit; derived for assemblies
    pub unit_price: f64,
    /// Depth in the tree, root = 0
    pub bom_level: u32,
    /// Part number of the immediate parent, `None` for roots
    pub parent_assembly: Option<String>,
    /// `true` for internal nodes
    pub is_assembly: bool,
    /// Supplier name (leaf components only)
    pub supplier: Option<String>,
    /// Child parts in discovery order
    #[serde(default)]
    pub children: Vec<Part>,
}

impl Part {
    /// Price contribution of this part to its parent.
    #[must_use]
    pub fn extended_price(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    /// Number of nodes in the subtree rooted at this part (including itself).
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }

    /// Whether this is a leaf component
    #[must_use]
    pub const fn is_component(&self) -> bool {
        !self.is_assembly
    }

    /// Attach a child and fold its extended price into this part's price.
    pub fn attach(&mut self, child: Self) {
        self.unit_price += child.extended_price();
        self.children.push(child);
    }
}
