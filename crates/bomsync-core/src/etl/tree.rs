//! Source rows → BOM forest

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::Part;
use crate::source::{AssemblyRecord, ComponentRecord, SourceStore};

/// Fetch every assembly from the source and build the forest of root
/// assemblies with prices aggregated bottom-up.
pub fn build_bom_tree(source: &impl SourceStore) -> Result<Vec<Part>> {
    let assemblies = source.list_assemblies()?;
    let forest = build_forest(&assemblies, |assembly_id| source.list_components(assembly_id))?;
    tracing::info!("Built BOM tree with {} root assemblies", forest.len());
    Ok(forest)
}

/// Build the forest from already fetched assembly rows.
///
/// Assemblies live in an arena indexed by their position in `assemblies`;
/// each node's children are index lists. Structure is validated before any
/// component is fetched:
/// - a parent id that matches no assembly fails with [`Error::DanglingParent`]
/// - assemblies unreachable from a root (parent cycles) fail with
///   [`Error::AssemblyCycle`]
/// - assemblies nested below [`MAX_ASSEMBLY_DEPTH`] fail with [`Error::Source`]
///
/// `components_of` is called once per reachable assembly.
pub fn build_forest<F>(assemblies: &[AssemblyRecord], mut components_of: F) -> Result<Vec<Part>>
where
    F: FnMut(&str) -> Result<Vec<ComponentRecord>>,
{
    let arena = Arena::index(assemblies)?;
    arena.check_reachable()?;

    let mut forest = Vec::with_capacity(arena.roots.len());
    for &root in &arena.roots {
        forest.push(arena.build_node(root, 0, None, &mut components_of)?);
    }
    Ok(forest)
}

/// Deepest assembly level accepted; node construction recurses once per level.
pub const MAX_ASSEMBLY_DEPTH: usize = 256;

struct Arena<'a> {
    assemblies: &'a [AssemblyRecord],
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a> Arena<'a> {
    fn index(assemblies: &'a [AssemblyRecord]) -> Result<Self> {
        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(assemblies.len());
        for (idx, assembly) in assemblies.iter().enumerate() {
            if by_id.insert(assembly.id.as_str(), idx).is_some() {
                return Err(Error::Source(format!(
                    "duplicate assembly id {} ({})",
                    assembly.id, assembly.part_number
                )));
            }
        }

        let mut children = vec![Vec::new(); assemblies.len()];
        let mut roots = Vec::new();
        for (idx, assembly) in assemblies.iter().enumerate() {
            match assembly.parent_assembly_id.as_deref() {
                None => roots.push(idx),
                Some(parent_id) => {
                    let parent = by_id.get(parent_id).ok_or_else(|| Error::DanglingParent {
                        part_number: assembly.part_number.clone(),
                        parent_id: parent_id.to_string(),
                    })?;
                    children[*parent].push(idx);
                }
            }
        }

        Ok(Self {
            assemblies,
            children,
            roots,
        })
    }

    /// Every assembly must hang off a root; the rest form parent cycles.
    /// Nesting is capped at [`MAX_ASSEMBLY_DEPTH`].
    fn check_reachable(&self) -> Result<()> {
        let mut visited = vec![false; self.assemblies.len()];
        let mut stack: Vec<(usize, usize)> = self.roots.iter().map(|&root| (root, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            if std::mem::replace(&mut visited[idx], true) {
                continue;
            }
            if depth > MAX_ASSEMBLY_DEPTH {
                return Err(Error::Source(format!(
                    "BOM deeper than {MAX_ASSEMBLY_DEPTH} levels at assembly {}",
                    self.assemblies[idx].part_number
                )));
            }
            stack.extend(self.children[idx].iter().map(|&child| (child, depth + 1)));
        }

        let cyclic: Vec<String> = visited
            .iter()
            .zip(self.assemblies)
            .filter(|(seen, _)| !**seen)
            .map(|(_, assembly)| assembly.part_number.clone())
            .collect();
        if cyclic.is_empty() {
            Ok(())
        } else {
            Err(Error::AssemblyCycle(cyclic))
        }
    }

    fn build_node<F>(
        &self,
        idx: usize,
        depth: u32,
        parent: Option<&str>,
        components_of: &mut F,
    ) -> Result<Part>
    where
        F: FnMut(&str) -> Result<Vec<ComponentRecord>>,
    {
        let assembly = &self.assemblies[idx];
        if assembly.bom_level != depth {
            tracing::debug!(
                "Assembly {} stored at level {} but sits at depth {}",
                assembly.part_number,
                assembly.bom_level,
                depth
            );
        }

        let mut node = Part {
            id: assembly.id.clone(),
            part_number: assembly.part_number.clone(),
            description: assembly.description.clone().unwrap_or_default(),
            category: assembly.category.clone(),
            quantity: assembly.quantity,
            unit_price: 0.0,
            bom_level: depth,
            parent_assembly: parent.map(str::to_string),
            is_assembly: true,
            supplier: None,
            children: Vec::new(),
        };

        for &child in &self.children[idx] {
            let subtree = self.build_node(
                child,
                depth + 1,
                Some(assembly.part_number.as_str()),
                components_of,
            )?;
            node.attach(subtree);
        }

        for component in components_of(&assembly.id)? {
            node.attach(leaf_part(component, &node));
        }

        Ok(node)
    }
}

fn leaf_part(component: ComponentRecord, parent: &Part) -> Part {
    Part {
        id: component.id,
        part_number: component.part_number.unwrap_or_default(),
        description: component.description.unwrap_or_default(),
        category: None,
        quantity: component.quantity,
        unit_price: component.unit_price.unwrap_or(0.0),
        bom_level: parent.bom_level + 1,
        parent_assembly: Some(parent.part_number.clone()),
        is_assembly: false,
        supplier: component.supplier,
        children: Vec::new(),
    }
}
