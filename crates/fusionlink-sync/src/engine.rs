//! Recursive BOM reconciliation engine
//!
//! Walks the component tree depth-first and, for every component, ensures a
//! matching registry part exists, its fields and parameters are current, and
//! its direct BOM lines exactly mirror the current instance counts. Each
//! distinct component is processed once per run; the registry is the source
//! of truth for names and part numbers once a match exists, so the walk
//! deliberately writes corrected values back into the design.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use fusionlink_core::{
    ComponentData, ComponentId, ComponentSource, Message, SyncError, SyncEvent,
    SyncEventDispatcher, Transcript,
};
use fusionlink_inventree::{
    NewPart, ParameterKind, Part, PartFields, PartPk, PartRegistry, TemplateMap,
};

use crate::matching::{resolve_existing, MatchOutcome, MissReason};

/// Tunables for one engine instance
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Category assigned to newly created parts
    pub category: Option<i64>,
    /// Part-number prefixes treated as host-generated rather than assigned
    pub default_name_prefixes: Vec<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            category: None,
            default_name_prefixes: vec![
                "Component".to_string(),
                "Körper".to_string(),
                "Body".to_string(),
                "Occurrence".to_string(),
            ],
        }
    }
}

/// Per-run state threaded through every recursive call
struct SyncContext {
    /// Components fully processed this run
    visited: HashSet<ComponentId>,
    /// Components on the current descent path, for cycle detection
    path: HashSet<ComponentId>,
    /// Registry pk for every component resolved so far
    resolved: HashMap<ComponentId, PartPk>,
    transcript: Transcript,
    dispatcher: SyncEventDispatcher,
    cancel: watch::Receiver<bool>,
}

impl SyncContext {
    fn log(&self, message: Message) {
        self.dispatcher
            .publish(SyncEvent::Message(message.clone()));
        self.transcript.push(message);
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// The reconciliation engine for one component source and one registry
pub struct SyncEngine {
    registry: Arc<dyn PartRegistry>,
    templates: TemplateMap,
    source: Arc<dyn ComponentSource>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        registry: Arc<dyn PartRegistry>,
        templates: TemplateMap,
        source: Arc<dyn ComponentSource>,
        options: SyncOptions,
    ) -> Self {
        Self {
            registry,
            templates,
            source,
            options,
        }
    }

    /// Synchronize the whole design, starting at the source's root
    ///
    /// Returns whether any warning or error was raised anywhere in the run.
    /// Registry failures abort the run and propagate.
    pub async fn sync_tree(
        &self,
        transcript: &Transcript,
        dispatcher: &SyncEventDispatcher,
        cancel: &watch::Receiver<bool>,
    ) -> Result<bool, SyncError> {
        let root = self.source.root();
        if self.source.node(&root).is_none() {
            return Err(SyncError::RootNotFound {
                id: root.to_string(),
            });
        }

        let mut ctx = SyncContext {
            visited: HashSet::new(),
            path: HashSet::new(),
            resolved: HashMap::new(),
            transcript: transcript.clone(),
            dispatcher: dispatcher.clone(),
            cancel: cancel.clone(),
        };
        let warnings = self.sync_node(root.clone(), &mut ctx).await?;
        ctx.visited.insert(root);
        Ok(warnings)
    }

    /// Synchronize one component and, depth-first, everything below it
    ///
    /// Boxed because the recursion depth follows the design's nesting.
    fn sync_node<'a>(
        &'a self,
        id: ComponentId,
        ctx: &'a mut SyncContext,
    ) -> Pin<Box<dyn Future<Output = Result<bool, SyncError>> + Send + 'a>> {
        Box::pin(async move {
            if ctx.cancelled() {
                return Err(SyncError::Cancelled);
            }

            let Some(mut data) = self.source.node(&id) else {
                ctx.log(Message::warning(format!(
                    "component '{}' is unknown to the design, skipping",
                    id
                )));
                return Ok(true);
            };
            ctx.dispatcher.publish(SyncEvent::NodeStarted {
                name: data.name.clone(),
            });
            debug!("synchronizing component '{}' ({})", data.name, id);

            // A part number that merely repeats the name was never really
            // assigned; clear it before any matching.
            if !data.part_number.is_empty()
                && data.name.to_lowercase() == data.part_number.to_lowercase()
            {
                self.source.set_part_number(&id, "");
                data.part_number.clear();
                ctx.log(Message::info(format!(
                    "cleared part number duplicating the name on '{}'",
                    data.name
                )));
            }

            let outcome = resolve_existing(
                self.registry.as_ref(),
                &self.templates,
                &data,
                &self.options.default_name_prefixes,
            )
            .await?;

            let mut warnings = false;
            let (part, freshly_created) = match outcome {
                MatchOutcome::Found(part) => {
                    ctx.log(Message::info(format!(
                        "matched '{}' to part {}",
                        data.name, part.pk
                    )));
                    (part, false)
                }
                MatchOutcome::NotFound(reason) => {
                    match reason {
                        MissReason::MissingIpn => {
                            warnings = true;
                            ctx.log(Message::warning(format!(
                                "no part number set on '{}', creating new part",
                                data.name
                            )));
                        }
                        MissReason::UnknownIpn => {
                            ctx.log(Message::info(format!(
                                "no part matches part number '{}', creating '{}'",
                                data.part_number, data.name
                            )));
                        }
                    }
                    self.source.set_part_number(&id, "");
                    data.part_number.clear();
                    let part = self.create_part(&data).await?;
                    (part, true)
                }
                MatchOutcome::Ambiguous(candidates) => {
                    // Unresolvable: several parts share this part number.
                    // Abort this subtree only; siblings proceed.
                    ctx.log(Message::error(format!(
                        "part number '{}' on '{}' matches {} parts, skipping this subtree",
                        data.part_number,
                        data.name,
                        candidates.len()
                    )));
                    return Ok(true);
                }
            };

            // The registry is canonical once a match exists; write its
            // name and part number back into the design.
            if part.name != data.name {
                ctx.log(Message::info(format!(
                    "renaming '{}' to '{}'",
                    data.name, part.name
                )));
                self.source.set_name(&id, &part.name);
                data.name = part.name.clone();
            }
            if part.ipn != data.part_number {
                self.source.set_part_number(&id, &part.ipn);
                data.part_number = part.ipn.clone();
            }

            // A part adopted as an assembly-to-be may carry stale BOM lines
            // from manual edits, and an assembly whose component lost all
            // children keeps lines nothing will rebuild; clear both before
            // any rebuild.
            let children = self.source.occurrences(&id);
            if !freshly_created && (!part.assembly || children.is_empty()) {
                self.clear_bom(part.pk).await?;
            }

            self.sync_fields(&part, &data, !children.is_empty()).await?;
            self.push_parameters(part.pk, &data).await?;
            ctx.resolved.insert(id.clone(), part.pk);

            if children.is_empty() {
                return Ok(warnings);
            }

            // Count instances per distinct child, keeping one display name
            // per child for reporting.
            let mut order: Vec<ComponentId> = Vec::new();
            let mut counts: HashMap<ComponentId, u32> = HashMap::new();
            let mut names: HashMap<ComponentId, String> = HashMap::new();
            for child in children {
                let count = counts.entry(child.clone()).or_insert(0);
                if *count == 0 {
                    names.insert(
                        child.clone(),
                        self.source
                            .node(&child)
                            .map(|d| d.name)
                            .unwrap_or_else(|| child.to_string()),
                    );
                    order.push(child.clone());
                }
                *count += 1;
            }

            ctx.path.insert(id.clone());
            for child in &order {
                if ctx.path.contains(child) {
                    warnings = true;
                    ctx.log(Message::warning(format!(
                        "'{}' contains itself through '{}', not descending",
                        data.name, names[child]
                    )));
                    continue;
                }
                if !ctx.visited.contains(child) {
                    warnings |= self.sync_node(child.clone(), ctx).await?;
                    ctx.visited.insert(child.clone());
                }
            }
            ctx.path.remove(&id);

            // Clear and rebuild so the remote BOM exactly mirrors the
            // current instance counts.
            self.clear_bom(part.pk).await?;
            for child in &order {
                match ctx.resolved.get(child) {
                    Some(sub_part) => {
                        self.registry
                            .create_bom_item(part.pk, *sub_part, f64::from(counts[child]))
                            .await?;
                    }
                    None => {
                        warnings = true;
                        ctx.log(Message::warning(format!(
                            "no part resolved for '{}', omitting it from the BOM of '{}'",
                            names[child], data.name
                        )));
                    }
                }
            }

            Ok(warnings)
        })
    }

    async fn create_part(&self, data: &ComponentData) -> Result<Part, SyncError> {
        let mut part = NewPart::new(&data.name, describe(data));
        part.category = self.options.category;
        Ok(self.registry.create_part(&part).await?)
    }

    async fn sync_fields(
        &self,
        part: &Part,
        data: &ComponentData,
        is_assembly: bool,
    ) -> Result<(), SyncError> {
        let fields = PartFields {
            name: Some(data.name.clone()),
            ipn: Some(data.part_number.clone()),
            description: Some(describe(data)),
            assembly: if is_assembly {
                Some(true)
            } else if part.assembly {
                // Demoted: the component no longer has children.
                Some(false)
            } else {
                None
            },
            category: None,
        };
        self.registry.update_part(part.pk, &fields).await?;
        Ok(())
    }

    /// Push every owned parameter; each write is independent, so a failure
    /// part-way leaves the earlier writes applied.
    async fn push_parameters(&self, pk: PartPk, data: &ComponentData) -> Result<(), SyncError> {
        let mut values: Vec<(ParameterKind, String)> = vec![
            (ParameterKind::Id, data.id.to_string()),
            (ParameterKind::Area, data.physical.area.to_string()),
            (ParameterKind::Volume, data.physical.volume.to_string()),
            (ParameterKind::Mass, data.physical.mass.to_string()),
            (ParameterKind::Density, data.physical.density.to_string()),
        ];
        if let Some(material) = &data.material {
            values.push((ParameterKind::Material, material.clone()));
        }
        if let Some(bbox) = &data.bounding_box {
            let (width, height, depth) = bbox.dimensions();
            values.push((ParameterKind::BoundingBoxWidth, width.to_string()));
            values.push((ParameterKind::BoundingBoxHeight, height.to_string()));
            values.push((ParameterKind::BoundingBoxDepth, depth.to_string()));
        }
        for (kind, value) in values {
            let template = self.templates.pk(kind)?;
            self.registry.set_parameter(pk, template, &value).await?;
        }
        Ok(())
    }

    async fn clear_bom(&self, pk: PartPk) -> Result<(), SyncError> {
        for item in self.registry.list_bom_items(pk).await? {
            self.registry.delete_bom_item(item.pk).await?;
        }
        Ok(())
    }
}

/// Description pushed to the registry, synthesized when the design has none
fn describe(data: &ComponentData) -> String {
    if data.description.is_empty() {
        format!("Fusion360 Name: {}", data.name)
    } else {
        data.description.clone()
    }
}
