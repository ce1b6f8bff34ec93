//! BOM forest → flat pre-order list

use crate::models::Part;

/// Flatten a forest depth-first in pre-order.
///
/// Every node appears exactly once, parents before their children, and each
/// subtree contiguously. `parent_assembly` is rewritten to the traversal
/// parent's part number (`None` for roots). The returned parts carry no
/// children.
pub fn flatten(forest: Vec<Part>) -> Vec<Part> {
    let mut flat = Vec::with_capacity(forest.iter().map(Part::subtree_len).sum());
    let mut stack: Vec<(Part, Option<String>)> =
        forest.into_iter().rev().map(|root| (root, None)).collect();

    while let Some((mut node, parent)) = stack.pop() {
        node.parent_assembly = parent;
        let children = std::mem::take(&mut node.children);
        let part_number = node.part_number.clone();
        flat.push(node);
        stack.extend(
            children
                .into_iter()
                .rev()
                .map(|child| (child, Some(part_number.clone()))),
        );
    }

    tracing::info!("Flattened BOM: {} total parts", flat.len());
    flat
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use pretty_assertions::assert_eq;

    fn node(part_number: &str, children: Vec<Part>) -> Part {
        let mut part = Part {
            id: part_number.to_lowercase(),
            part_number: part_number.to_string(),
            description: format!("{part_number} node"),
            category: None,
            quantity: 1,
            unit_price: 1.0,
            bom_level: 0,
            parent_assembly: Some("STALE".to_string()),
            is_assembly: !children.is_empty(),
            supplier: None,
            children: Vec::new(),
        };
        for child in children {
            part.attach(child);
        }
        part
    }

    fn sample_forest() -> Vec<Part> {
        vec![
            node(
                "ASM-1",
                vec![
                    node("ASM-2", vec![node("PRT-1", vec![]), node("PRT-2", vec![])]),
                    node("PRT-3", vec![]),
                ],
            ),
            node("ASM-3", vec![node("PRT-4", vec![])]),
        ]
    }

    #[test]
    fn flatten_is_pre_order() {
        let flat = flatten(sample_forest());
        let order: Vec<&str> = flat.iter().map(|p| p.part_number.as_str()).collect();
        assert_eq!(
            order,
            vec!["ASM-1", "ASM-2", "PRT-1", "PRT-2", "PRT-3", "ASM-3", "PRT-4"]
        );
    }

    #[test]
    fn flatten_preserves_size_and_parents_precede_children() {
        let forest = sample_forest();
        let expected: usize = forest.iter().map(Part::subtree_len).sum();
        let flat = flatten(forest);
        assert_eq!(flat.len(), expected);

        let mut seen = HashSet::new();
        for part in &flat {
            if let Some(parent) = &part.parent_assembly {
                assert!(seen.contains(parent.as_str()), "{parent} not before {}", part.part_number);
            }
            seen.insert(part.part_number.as_str());
        }
    }

    #[test]
    fn flatten_rewrites_parent_links() {
        let flat = flatten(sample_forest());
        let parent_of = |pn: &str| {
            flat.iter()
                .find(|p| p.part_number == pn)
                .and_then(|p| p.parent_assembly.clone())
        };

        assert_eq!(parent_of("ASM-1"), None);
        assert_eq!(parent_of("ASM-3"), None);
        assert_eq!(parent_of("ASM-2").as_deref(), Some("ASM-1"));
        assert_eq!(parent_of("PRT-2").as_deref(), Some("ASM-2"));
        assert_eq!(parent_of("PRT-4").as_deref(), Some("ASM-3"));
        assert!(flat.iter().all(|p| p.children.is_empty()));
    }

    #[test]
    fn flatten_empty_forest() {
        assert!(flatten(Vec::new()).is_empty());
    }
}
