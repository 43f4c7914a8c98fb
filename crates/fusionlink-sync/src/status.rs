//! Per-component sync status lookup

use std::collections::HashMap;

use fusionlink_core::{ApiError, ComponentId};
use fusionlink_inventree::{ParameterKind, PartPk, PartRegistry, TemplateMap};

/// Resolve each component id to its registry part, if one exists
///
/// Pure lookup by the stored component-id parameter; nothing is created or
/// modified. Backs the synced/not-synced column of the BOM overview.
pub async fn sync_status(
    registry: &dyn PartRegistry,
    templates: &TemplateMap,
    ids: &[ComponentId],
) -> Result<HashMap<ComponentId, Option<PartPk>>, ApiError> {
    let id_template = templates.pk(ParameterKind::Id)?;
    let mut status = HashMap::with_capacity(ids.len());
    for id in ids {
        let hits = registry.find_by_parameter(id_template, id.as_str()).await?;
        status.insert(id.clone(), hits.first().copied());
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusionlink_inventree::InMemoryRegistry;

    #[tokio::test]
    async fn test_status_reports_synced_and_unsynced() {
        let registry = InMemoryRegistry::new();
        let templates = TemplateMap::initialize(&registry).await.unwrap();
        let id_template = templates.pk(ParameterKind::Id).unwrap();

        let pk = registry.insert_part("Bracket", "BRK-001");
        registry.insert_parameter(pk, id_template, "comp-1");

        let ids = vec![ComponentId::from("comp-1"), ComponentId::from("comp-2")];
        let status = sync_status(&registry, &templates, &ids).await.unwrap();
        assert_eq!(status[&ComponentId::from("comp-1")], Some(pk));
        assert_eq!(status[&ComponentId::from("comp-2")], None);
    }
}
