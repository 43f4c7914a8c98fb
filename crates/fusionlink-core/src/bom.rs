//! BOM extraction from a component tree
//!
//! Flattens the design into unique components with aggregated instance
//! counts, and produces a hierarchical listing for display. Both walks are
//! cycle-safe: a component reachable through several paths is listed once in
//! the flat BOM, with its instances summed across all parents.

use std::collections::HashMap;

use crate::component::{ComponentId, ComponentSource};

/// One line of a flattened BOM
#[derive(Debug, Clone, PartialEq)]
pub struct BomLine {
    /// Component id
    pub id: ComponentId,
    /// Display name
    pub name: String,
    /// Internal part number, possibly empty
    pub part_number: String,
    /// Total instance count across the whole design
    pub instances: u32,
}

/// One node of the hierarchical display tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Component id
    pub id: ComponentId,
    /// Display name
    pub name: String,
    /// Parent component id; `None` for the root
    pub parent: Option<ComponentId>,
    /// Nesting depth, root at 0
    pub depth: usize,
    /// Whether the component has child occurrences
    pub is_assembly: bool,
}

/// Flatten the design below `root` into unique components with counts
///
/// The root itself is not a BOM line; only components that occur somewhere
/// below it are listed. Order is first-encounter order of the walk.
pub fn flatten_bom(source: &dyn ComponentSource, root: &ComponentId) -> Vec<BomLine> {
    let mut order: Vec<ComponentId> = Vec::new();
    let mut counts: HashMap<ComponentId, u32> = HashMap::new();
    let mut expanded: HashMap<ComponentId, bool> = HashMap::new();
    let mut stack: Vec<ComponentId> = vec![root.clone()];

    while let Some(id) = stack.pop() {
        for child in source.occurrences(&id) {
            let count = counts.entry(child.clone()).or_insert(0);
            if *count == 0 {
                order.push(child.clone());
            }
            *count += 1;

            // Expand each unique component once, even through shared or
            // cyclic references.
            if !expanded.get(&child).copied().unwrap_or(false) {
                expanded.insert(child.clone(), true);
                stack.push(child);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| {
            let data = source.node(&id)?;
            Some(BomLine {
                instances: counts.get(&id).copied().unwrap_or(0),
                id,
                name: data.name,
                part_number: data.part_number,
            })
        })
        .collect()
}

/// Produce a depth-first hierarchical listing of the design
///
/// Each occurrence produces one entry, so repeated children appear per
/// instance; descent into a component's children happens only the first time
/// it is encountered, which keeps the listing finite on shared sub-assemblies
/// and cycles.
pub fn component_tree(source: &dyn ComponentSource, root: &ComponentId) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    let mut visited: HashMap<ComponentId, bool> = HashMap::new();
    walk_tree(source, root, None, 0, &mut visited, &mut nodes);
    nodes
}

fn walk_tree(
    source: &dyn ComponentSource,
    id: &ComponentId,
    parent: Option<&ComponentId>,
    depth: usize,
    visited: &mut HashMap<ComponentId, bool>,
    out: &mut Vec<TreeNode>,
) {
    let Some(data) = source.node(id) else {
        return;
    };
    let children = source.occurrences(id);
    out.push(TreeNode {
        id: id.clone(),
        name: data.name,
        parent: parent.cloned(),
        depth,
        is_assembly: !children.is_empty(),
    });

    let first_visit = !visited.get(id).copied().unwrap_or(false);
    visited.insert(id.clone(), true);
    if !first_visit {
        return;
    }
    for child in children {
        walk_tree(source, &child, Some(id), depth + 1, visited, out);
    }
}
