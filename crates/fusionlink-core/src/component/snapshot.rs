//! In-memory design snapshot
//!
//! A [`DesignSnapshot`] is the serialized form of a component tree as
//! exported from the CAD host: a node table keyed by component id, a root
//! id, and per-node occurrence lists. It implements [`ComponentSource`] so
//! the synchronizer can run against it exactly as it would against a live
//! design session.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::{ComponentData, ComponentId, ComponentSource};
use crate::error::SnapshotError;

/// One component in a snapshot: attributes plus direct occurrences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// Component attributes
    #[serde(flatten)]
    pub data: ComponentData,
    /// Direct child occurrences, one entry per instance
    #[serde(default)]
    pub occurrences: Vec<ComponentId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    root: ComponentId,
    components: Vec<SnapshotNode>,
}

/// Owned, mutable component tree
///
/// Nodes live behind an `RwLock` so the synchronizer's write-backs work
/// through a shared reference, mirroring how a CAD host exposes a live
/// mutable object graph.
#[derive(Debug)]
pub struct DesignSnapshot {
    root: ComponentId,
    nodes: RwLock<HashMap<ComponentId, SnapshotNode>>,
}

impl DesignSnapshot {
    /// Build a snapshot from a root id and a node list
    ///
    /// Validates that the root exists and that every occurrence references a
    /// known component.
    pub fn new(
        root: ComponentId,
        components: Vec<SnapshotNode>,
    ) -> Result<Self, SnapshotError> {
        let nodes: HashMap<ComponentId, SnapshotNode> = components
            .into_iter()
            .map(|node| (node.data.id.clone(), node))
            .collect();

        if !nodes.contains_key(&root) {
            return Err(SnapshotError::MissingRoot {
                id: root.to_string(),
            });
        }
        for (id, node) in &nodes {
            for child in &node.occurrences {
                if !nodes.contains_key(child) {
                    return Err(SnapshotError::DanglingOccurrence {
                        parent: id.to_string(),
                        child: child.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            root,
            nodes: RwLock::new(nodes),
        })
    }

    /// Load a snapshot from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, SnapshotError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SnapshotError::Read {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let snapshot = Self::from_json(&content)?;
        debug!(
            "loaded snapshot {} with {} components",
            path.display(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        Self::new(file.root, file.components)
    }

    /// Serialize the current tree state back to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        let nodes = self.nodes.read();
        let mut components: Vec<SnapshotNode> = nodes.values().cloned().collect();
        components.sort_by(|a, b| a.data.id.cmp(&b.data.id));
        serde_json::to_string_pretty(&SnapshotFile {
            root: self.root.clone(),
            components,
        })
    }

    /// Number of components in the snapshot
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the snapshot contains no components
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl ComponentSource for DesignSnapshot {
    fn root(&self) -> ComponentId {
        self.root.clone()
    }

    fn node(&self, id: &ComponentId) -> Option<ComponentData> {
        self.nodes.read().get(id).map(|node| node.data.clone())
    }

    fn occurrences(&self, id: &ComponentId) -> Vec<ComponentId> {
        self.nodes
            .read()
            .get(id)
            .map(|node| node.occurrences.clone())
            .unwrap_or_default()
    }

    fn set_name(&self, id: &ComponentId, name: &str) {
        if let Some(node) = self.nodes.write().get_mut(id) {
            node.data.name = name.to_string();
        }
    }

    fn set_part_number(&self, id: &ComponentId, part_number: &str) {
        if let Some(node) = self.nodes.write().get_mut(id) {
            node.data.part_number = part_number.to_string();
        }
    }
}
