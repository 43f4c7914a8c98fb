//! # FusionLink Core
//!
//! Core types, traits, and utilities for FusionLink.
//! Provides the component tree abstraction, the design snapshot format,
//! run transcripts, sync events, and the shared error types.

pub mod bom;
pub mod component;
pub mod error;
pub mod event;
pub mod message;

pub use bom::{component_tree, flatten_bom, BomLine, TreeNode};

pub use component::{
    BoundingBox, ComponentData, ComponentId, ComponentSource, DesignSnapshot,
    PhysicalProperties, Point3, SnapshotNode,
};

pub use error::{ApiError, Error, Result, SnapshotError, SyncError};

pub use event::{SyncEvent, SyncEventDispatcher};

pub use message::{Message, MessageLevel, Transcript};
