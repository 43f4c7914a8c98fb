//! # FusionLink InvenTree
//!
//! InvenTree part registry access for FusionLink: the wire model, the
//! [`PartRegistry`] trait the synchronizer is written against, the live
//! HTTP client, the parameter template map, and an in-memory registry for
//! tests.

pub mod client;
pub mod memory;
pub mod model;
pub mod registry;
pub mod templates;

pub use client::InvenTreeClient;
pub use memory::{CallCounters, InMemoryRegistry};
pub use model::{
    BomItem, NewBomItem, NewParameter, NewPart, Parameter, ParameterTemplate, Part,
    PartCategory, PartFields, PartPk,
};
pub use registry::PartRegistry;
pub use templates::{ParameterKind, TemplateMap};
