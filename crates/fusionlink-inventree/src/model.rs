//! Wire model for the InvenTree REST API
//!
//! Plain serde structs matching the JSON shapes the server exchanges.
//! Field names follow the server's conventions, which is why `IPN` is
//! upper-case and the assembly-capable flag is called `virtual` remotely.

use serde::{Deserialize, Serialize};

/// Primary key of a part record on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartPk(pub i64);

impl std::fmt::Display for PartPk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A part record as returned by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Server-side primary key
    pub pk: PartPk,
    /// Canonical display name
    pub name: String,
    /// Internal part number, possibly empty
    #[serde(rename = "IPN", default)]
    pub ipn: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Whether the part has a BOM of its own
    #[serde(default)]
    pub assembly: bool,
    /// Whether the part is active
    #[serde(default)]
    pub active: bool,
    /// Category primary key, if assigned
    #[serde(default)]
    pub category: Option<i64>,
}

/// Payload for creating a new part
#[derive(Debug, Clone, Serialize)]
pub struct NewPart {
    pub name: String,
    #[serde(rename = "IPN")]
    pub ipn: String,
    pub description: String,
    pub active: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
}

impl NewPart {
    /// A fresh part payload with the server defaults FusionLink uses
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ipn: String::new(),
            description: description.into(),
            active: true,
            is_virtual: false,
            category: None,
        }
    }
}

/// Partial update payload for an existing part
///
/// Only fields set to `Some` are sent, so unrelated server-side fields are
/// never clobbered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "IPN", skip_serializing_if = "Option::is_none")]
    pub ipn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<i64>,
}

impl PartFields {
    /// Whether the update carries nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ipn.is_none()
            && self.description.is_none()
            && self.assembly.is_none()
            && self.category.is_none()
    }
}

/// One BOM line on the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomItem {
    /// Server-side primary key of the BOM line itself
    pub pk: i64,
    /// The parent assembly part
    pub part: PartPk,
    /// The child part
    pub sub_part: PartPk,
    /// Instance count; the server models this as a decimal
    pub quantity: f64,
}

/// Payload for creating a BOM line
#[derive(Debug, Clone, Serialize)]
pub struct NewBomItem {
    pub part: PartPk,
    pub sub_part: PartPk,
    pub quantity: f64,
}

/// A parameter value attached to a part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Server-side primary key of the parameter row
    pub pk: i64,
    /// The part the parameter belongs to
    pub part: PartPk,
    /// The template this parameter instantiates
    pub template: i64,
    /// The stored value, always a string on the wire
    pub data: String,
}

/// Payload for creating a parameter value
#[derive(Debug, Clone, Serialize)]
pub struct NewParameter {
    pub part: PartPk,
    pub template: i64,
    pub data: String,
}

/// A parameter template definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterTemplate {
    /// Server-side primary key
    pub pk: i64,
    /// Template name
    pub name: String,
    /// Units string, possibly empty
    #[serde(default)]
    pub units: String,
}

/// A part category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartCategory {
    /// Server-side primary key
    pub pk: i64,
    /// Category name
    pub name: String,
    /// Full slash-separated path
    #[serde(default)]
    pub pathstring: String,
}
