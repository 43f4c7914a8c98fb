//! Physical attributes derived from component geometry
//!
//! These values are read-only inputs to synchronization: they are extracted
//! from the CAD model and pushed to the registry as typed parameters.

use serde::{Deserialize, Serialize};

/// Physical properties of a single component
///
/// Units follow the Fusion360 export conventions: areas in cm2, volumes in
/// cm3, masses in kg, densities in kg/cm3.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhysicalProperties {
    /// Surface area in cm2
    pub area: f64,
    /// Solid volume in cm3
    pub volume: f64,
    /// Mass in kg
    pub mass: f64,
    /// Density in kg/cm3
    pub density: f64,
}

/// A point in model space, in cm
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Axis-aligned bounding box of a component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Point3,
    /// Maximum corner
    pub max: Point3,
}

impl BoundingBox {
    /// Extents of the box as (width, height, depth), in cm
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        )
    }
}
