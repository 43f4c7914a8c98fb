//! Component tree model
//!
//! The CAD host owns the assembly graph; FusionLink only reads it through the
//! [`ComponentSource`] trait and writes back exactly two fields (name and part
//! number) when the registry's canonical values differ. Everything else is
//! read-only input.

pub mod physical;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use physical::{BoundingBox, PhysicalProperties, Point3};
pub use snapshot::{DesignSnapshot, SnapshotNode};

/// Stable component identifier, assigned by the CAD host
///
/// Opaque and immutable; the primary matching key against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Read snapshot of a single component's attributes
///
/// Returned by value from [`ComponentSource::node`]; mutating it has no
/// effect on the underlying design. Write-backs go through the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentData {
    /// Stable unique id
    pub id: ComponentId,
    /// Display name; may be corrected during sync
    pub name: String,
    /// Internal part number (IPN); may be cleared or corrected during sync
    #[serde(default)]
    pub part_number: String,
    /// Free-text description, possibly empty
    #[serde(default)]
    pub description: String,
    /// Derived physical properties
    #[serde(default)]
    pub physical: PhysicalProperties,
    /// Material name, if assigned
    #[serde(default)]
    pub material: Option<String>,
    /// Bounding box, if geometry exists
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

/// Read/write view over the CAD assembly graph
///
/// The synchronizer is decoupled from any CAD SDK by this trait: it only
/// needs per-node attribute reads, the direct occurrence list, and the two
/// deliberate write-backs. Occurrence lists are finite and restartable; a
/// child id appearing N times means N instances in the parent's BOM.
pub trait ComponentSource: Send + Sync {
    /// The root component of the design
    fn root(&self) -> ComponentId;

    /// Attributes of one component, or `None` for an unknown id
    fn node(&self, id: &ComponentId) -> Option<ComponentData>;

    /// Direct occurrences of a component, one entry per instance
    fn occurrences(&self, id: &ComponentId) -> Vec<ComponentId>;

    /// Overwrite a component's display name. No-op for an unknown id.
    fn set_name(&self, id: &ComponentId, name: &str);

    /// Overwrite a component's part number. No-op for an unknown id.
    fn set_part_number(&self, id: &ComponentId, part_number: &str);
}
