//! Parameter templates FusionLink maintains on the server
//!
//! Every synchronized part carries a fixed set of parameters. Their
//! templates are created server-side on first contact and resolved to
//! primary keys once per run.

use std::collections::HashMap;

use tracing::info;

use fusionlink_core::ApiError;

use crate::registry::PartRegistry;

/// The parameters FusionLink owns on each part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Stable component id from the CAD host
    Id,
    /// Surface area
    Area,
    /// Volume
    Volume,
    /// Mass
    Mass,
    /// Density
    Density,
    /// Material name
    Material,
    /// Bounding box width
    BoundingBoxWidth,
    /// Bounding box height
    BoundingBoxHeight,
    /// Bounding box depth
    BoundingBoxDepth,
}

impl ParameterKind {
    /// All kinds, in template creation order
    pub const ALL: [ParameterKind; 9] = [
        ParameterKind::Id,
        ParameterKind::Area,
        ParameterKind::Volume,
        ParameterKind::Mass,
        ParameterKind::Density,
        ParameterKind::Material,
        ParameterKind::BoundingBoxWidth,
        ParameterKind::BoundingBoxHeight,
        ParameterKind::BoundingBoxDepth,
    ];

    /// Template name on the server
    pub fn name(&self) -> &'static str {
        match self {
            ParameterKind::Id => "Fusion360:Id",
            ParameterKind::Area => "Fusion360:Area",
            ParameterKind::Volume => "Fusion360:Volume",
            ParameterKind::Mass => "Fusion360:Mass",
            ParameterKind::Density => "Fusion360:Density",
            ParameterKind::Material => "Fusion360:Material",
            ParameterKind::BoundingBoxWidth => "Fusion360:BoundingBox:Width",
            ParameterKind::BoundingBoxHeight => "Fusion360:BoundingBox:Height",
            ParameterKind::BoundingBoxDepth => "Fusion360:BoundingBox:Depth",
        }
    }

    /// Units string the template is defined with
    pub fn units(&self) -> &'static str {
        match self {
            ParameterKind::Id | ParameterKind::Material => "",
            ParameterKind::Area => "cm2",
            ParameterKind::Volume => "cm3",
            ParameterKind::Mass => "kg",
            ParameterKind::Density => "kg/cm3",
            ParameterKind::BoundingBoxWidth
            | ParameterKind::BoundingBoxHeight
            | ParameterKind::BoundingBoxDepth => "cm",
        }
    }
}

/// Resolved template name to primary key mapping for one server
#[derive(Debug, Clone)]
pub struct TemplateMap {
    pks: HashMap<ParameterKind, i64>,
}

impl TemplateMap {
    /// Resolve every [`ParameterKind`] against the server, creating any
    /// template that does not exist yet
    pub async fn initialize(registry: &dyn PartRegistry) -> Result<Self, ApiError> {
        let mut existing: HashMap<String, i64> = registry
            .list_templates()
            .await?
            .into_iter()
            .map(|t| (t.name, t.pk))
            .collect();

        let mut pks = HashMap::new();
        for kind in ParameterKind::ALL {
            let pk = match existing.remove(kind.name()) {
                Some(pk) => pk,
                None => {
                    info!("Creating parameter template '{}'", kind.name());
                    registry.create_template(kind.name(), kind.units()).await?.pk
                }
            };
            pks.insert(kind, pk);
        }
        Ok(Self { pks })
    }

    /// Primary key of a template
    pub fn pk(&self, kind: ParameterKind) -> Result<i64, ApiError> {
        self.pks
            .get(&kind)
            .copied()
            .ok_or_else(|| ApiError::MissingTemplate {
                name: kind.name().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_names_and_units() {
        assert_eq!(ParameterKind::Id.name(), "Fusion360:Id");
        assert_eq!(ParameterKind::Id.units(), "");
        assert_eq!(ParameterKind::Density.units(), "kg/cm3");
        assert_eq!(
            ParameterKind::BoundingBoxDepth.name(),
            "Fusion360:BoundingBox:Depth"
        );
        assert_eq!(ParameterKind::BoundingBoxDepth.units(), "cm");
    }

    #[test]
    fn test_all_kinds_distinct() {
        let names: std::collections::HashSet<_> =
            ParameterKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ParameterKind::ALL.len());
    }
}
