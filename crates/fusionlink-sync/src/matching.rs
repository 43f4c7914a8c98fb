//! Create-or-link match resolution
//!
//! Decides which existing registry part, if any, corresponds to a CAD
//! component. The stored component-id parameter is authoritative; the part
//! number is only a fallback and can be missing, host-generated, or shared
//! by several parts.

use fusionlink_core::{ApiError, ComponentData};
use fusionlink_inventree::{ParameterKind, Part, PartRegistry, TemplateMap};

/// Why no existing part matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The component has no usable part number (empty or host-generated)
    MissingIpn,
    /// The part number is set but matches nothing
    UnknownIpn,
}

/// Result of matching one component against the registry
#[derive(Debug)]
pub enum MatchOutcome {
    /// Exactly one existing part corresponds to the component
    Found(Part),
    /// No existing part corresponds; a new one must be created
    NotFound(MissReason),
    /// Several parts share the component's part number
    Ambiguous(Vec<Part>),
}

/// Whether a part number looks generated by the CAD host rather than
/// assigned by a person
pub fn is_host_default(part_number: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| part_number.starts_with(p.as_str()))
}

/// Resolve a component to an existing registry part
///
/// Lookup by the stored component-id parameter wins outright. Only on a
/// miss does the part number get consulted, and only when it is non-empty
/// and not host-generated.
pub async fn resolve_existing(
    registry: &dyn PartRegistry,
    templates: &TemplateMap,
    data: &ComponentData,
    default_prefixes: &[String],
) -> Result<MatchOutcome, ApiError> {
    let id_template = templates.pk(ParameterKind::Id)?;
    let by_id = registry
        .find_by_parameter(id_template, data.id.as_str())
        .await?;
    if let Some(pk) = by_id.first() {
        return Ok(MatchOutcome::Found(registry.get_part(*pk).await?));
    }

    if data.part_number.is_empty() || is_host_default(&data.part_number, default_prefixes) {
        return Ok(MatchOutcome::NotFound(MissReason::MissingIpn));
    }

    let mut candidates: Vec<Part> = registry
        .find_by_ipn(&data.part_number)
        .await?
        .into_iter()
        .filter(|p| !p.ipn.is_empty())
        .collect();
    match candidates.len() {
        0 => Ok(MatchOutcome::NotFound(MissReason::UnknownIpn)),
        1 => Ok(MatchOutcome::Found(candidates.remove(0))),
        _ => Ok(MatchOutcome::Ambiguous(candidates)),
    }
}
