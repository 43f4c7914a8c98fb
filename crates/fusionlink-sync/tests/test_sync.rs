//! End-to-end reconciliation tests against the in-memory registry

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use fusionlink_core::{
    ApiError, ComponentData, ComponentId, ComponentSource, DesignSnapshot, MessageLevel,
    PhysicalProperties, SnapshotNode, SyncError, SyncEventDispatcher, Transcript,
};
use fusionlink_inventree::{
    BomItem, InMemoryRegistry, NewPart, Parameter, ParameterKind, ParameterTemplate, Part,
    PartCategory, PartFields, PartPk, PartRegistry, TemplateMap,
};
use fusionlink_sync::{CancelHandle, SyncEngine, SyncOptions, SyncRunner};

fn node(id: &str, name: &str, ipn: &str, children: &[&str]) -> SnapshotNode {
    SnapshotNode {
        data: ComponentData {
            id: ComponentId::from(id),
            name: name.to_string(),
            part_number: ipn.to_string(),
            description: String::new(),
            physical: PhysicalProperties {
                area: 10.0,
                volume: 5.0,
                mass: 0.2,
                density: 0.04,
            },
            material: Some("Steel".to_string()),
            bounding_box: None,
        },
        occurrences: children.iter().map(|c| ComponentId::from(*c)).collect(),
    }
}

async fn engine_for(
    snapshot: DesignSnapshot,
) -> (Arc<InMemoryRegistry>, Arc<DesignSnapshot>, SyncEngine) {
    let registry = Arc::new(InMemoryRegistry::new());
    let templates = TemplateMap::initialize(registry.as_ref()).await.unwrap();
    let snapshot = Arc::new(snapshot);
    let engine = SyncEngine::new(
        registry.clone(),
        templates,
        snapshot.clone(),
        SyncOptions::default(),
    );
    (registry, snapshot, engine)
}

async fn run(engine: &SyncEngine) -> (bool, Transcript) {
    let transcript = Transcript::new();
    let dispatcher = SyncEventDispatcher::default();
    let (_handle, cancel) = CancelHandle::new();
    let warnings = engine
        .sync_tree(&transcript, &dispatcher, &cancel)
        .await
        .unwrap();
    (warnings, transcript)
}

fn part_named(registry: &InMemoryRegistry, name: &str) -> Part {
    registry
        .all_parts()
        .into_iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("no part named '{}'", name))
}

#[tokio::test]
async fn test_end_to_end_assembly_sync() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("r"),
        vec![
            node("r", "Rig", "RIG-001", &["c", "c", "d"]),
            node("c", "Clamp", "CLP-001", &[]),
            node("d", "Dowel", "DWL-001", &[]),
        ],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;

    let (warnings, _) = run(&engine).await;
    assert!(!warnings);
    assert_eq!(registry.counters().create_part, 3);

    let rig = part_named(&registry, "Rig");
    assert!(rig.assembly);
    let clamp = part_named(&registry, "Clamp");
    let dowel = part_named(&registry, "Dowel");

    let bom = registry.bom_of(rig.pk);
    let lines: Vec<(PartPk, f64)> = bom.iter().map(|b| (b.sub_part, b.quantity)).collect();
    assert!(lines.contains(&(clamp.pk, 2.0)));
    assert!(lines.contains(&(dowel.pk, 1.0)));
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("r"),
        vec![
            node("r", "Rig", "RIG-001", &["c", "c", "d"]),
            node("c", "Clamp", "CLP-001", &[]),
            node("d", "Dowel", "DWL-001", &[]),
        ],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;

    run(&engine).await;
    let parts_after_first = registry.all_parts().len();
    let rig = part_named(&registry, "Rig");
    let bom_first: Vec<(PartPk, f64)> = registry
        .bom_of(rig.pk)
        .iter()
        .map(|b| (b.sub_part, b.quantity))
        .collect();

    let (warnings, _) = run(&engine).await;
    assert!(!warnings);
    assert_eq!(registry.counters().create_part, 3);
    assert_eq!(registry.all_parts().len(), parts_after_first);
    let bom_second: Vec<(PartPk, f64)> = registry
        .bom_of(rig.pk)
        .iter()
        .map(|b| (b.sub_part, b.quantity))
        .collect();
    assert_eq!(bom_first, bom_second);
}

#[tokio::test]
async fn test_id_parameter_match_beats_differing_ipn() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Bracket", "NEW-IPN", &[])],
    )
    .unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let templates = TemplateMap::initialize(registry.as_ref()).await.unwrap();
    let id_template = templates.pk(ParameterKind::Id).unwrap();

    let existing = registry.insert_part("Bracket", "OLD-IPN");
    registry.insert_parameter(existing, id_template, "x");

    let snapshot = Arc::new(snapshot);
    let engine = SyncEngine::new(
        registry.clone(),
        templates,
        snapshot.clone(),
        SyncOptions::default(),
    );
    run(&engine).await;

    assert_eq!(registry.counters().create_part, 0);
    // The registry's IPN is canonical and gets written back to the design.
    let data = snapshot.node(&ComponentId::from("x")).unwrap();
    assert_eq!(data.part_number, "OLD-IPN");
}

#[tokio::test]
async fn test_ambiguous_ipn_aborts_subtree() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![
            node("x", "Bracket", "DUP-1", &["y"]),
            node("y", "Bolt", "BLT-001", &[]),
        ],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;
    registry.insert_part("Bracket", "DUP-1");
    registry.insert_part("Bracket mk2", "DUP-1");

    let (warnings, transcript) = run(&engine).await;
    assert!(warnings);
    assert_eq!(registry.counters().create_part, 0);
    assert_eq!(registry.counters().update_part, 0);
    assert!(registry.find_by_ipn("BLT-001").await.unwrap().is_empty());

    let errors: Vec<_> = transcript
        .messages()
        .into_iter()
        .filter(|m| m.level == MessageLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].text.contains("DUP-1"));
    assert!(errors[0].text.contains("Bracket"));
}

#[tokio::test]
async fn test_shared_child_created_once() {
    // Diamond: root holds two sub-assemblies that both contain the same leaf.
    let snapshot = DesignSnapshot::new(
        ComponentId::from("r"),
        vec![
            node("r", "Rig", "RIG-001", &["s1", "s2"]),
            node("s1", "Left arm", "ARM-L", &["bolt"]),
            node("s2", "Right arm", "ARM-R", &["bolt"]),
            node("bolt", "Bolt", "BLT-001", &[]),
        ],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;

    let (warnings, _) = run(&engine).await;
    assert!(!warnings);
    assert_eq!(registry.counters().create_part, 4);
    // The bolt is created once, with its unmatched part number cleared.
    let bolts: Vec<_> = registry
        .all_parts()
        .into_iter()
        .filter(|p| p.name == "Bolt")
        .collect();
    assert_eq!(bolts.len(), 1);
    assert_eq!(bolts[0].ipn, "");

    // Both sub-assemblies still list the shared leaf in their BOMs.
    let bolt = part_named(&registry, "Bolt");
    for arm in ["Left arm", "Right arm"] {
        let part = part_named(&registry, arm);
        let bom = registry.bom_of(part.pk);
        assert_eq!(bom.len(), 1);
        assert_eq!(bom[0].sub_part, bolt.pk);
    }
}

#[tokio::test]
async fn test_name_part_number_collision_cleared() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Bracket-01", "bracket-01", &[])],
    )
    .unwrap();
    let (registry, snapshot, engine) = engine_for(snapshot).await;

    let (warnings, transcript) = run(&engine).await;
    // Clearing leaves the node without a usable part number, which is
    // reported as a warning on the create path.
    assert!(warnings);
    assert!(transcript
        .messages()
        .iter()
        .any(|m| m.text.contains("cleared part number")));

    let data = snapshot.node(&ComponentId::from("x")).unwrap();
    assert_eq!(data.part_number, "");
    let created = part_named(&registry, "Bracket-01");
    assert_eq!(created.ipn, "");
    assert_eq!(registry.counters().create_part, 1);
}

#[tokio::test]
async fn test_host_default_part_number_treated_as_unset() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Spacer", "Component17:1", &[])],
    )
    .unwrap();
    let (registry, snapshot, engine) = engine_for(snapshot).await;
    // A part with the host-generated number exists but must not be adopted.
    registry.insert_part("Old spacer", "Component17:1");

    let (warnings, _) = run(&engine).await;
    assert!(warnings);
    assert_eq!(registry.counters().create_part, 1);
    assert_eq!(
        snapshot.node(&ComponentId::from("x")).unwrap().part_number,
        ""
    );
}

#[tokio::test]
async fn test_parameters_pushed_on_create() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Plate", "PLT-001", &[])],
    )
    .unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let templates = TemplateMap::initialize(registry.as_ref()).await.unwrap();
    let engine = SyncEngine::new(
        registry.clone(),
        templates.clone(),
        Arc::new(snapshot),
        SyncOptions::default(),
    );
    run(&engine).await;

    let plate = part_named(&registry, "Plate");
    let value = |kind| {
        registry
            .parameter_value(plate.pk, templates.pk(kind).unwrap())
            .unwrap()
    };
    assert_eq!(value(ParameterKind::Id), "x");
    assert_eq!(value(ParameterKind::Mass), "0.2");
    assert_eq!(value(ParameterKind::Material), "Steel");
    assert_eq!(value(ParameterKind::Density), "0.04");
}

#[tokio::test]
async fn test_stale_bom_cleared_on_adopted_leaf() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Plate", "PLT-001", &[])],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;

    // Existing non-assembly part with BOM lines left over from manual edits.
    let plate = registry.insert_part("Plate", "PLT-001");
    let stray = registry.insert_part("Stray", "STR-001");
    registry.create_bom_item(plate, stray, 4.0).await.unwrap();

    run(&engine).await;
    assert!(registry.bom_of(plate).is_empty());
}

#[tokio::test]
async fn test_demoted_assembly_clears_stale_bom() {
    // The component lost all its children; the remote part is still flagged
    // assembly and carries BOM lines from the previous state.
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Gearbox", "GBX-001", &[])],
    )
    .unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let templates = TemplateMap::initialize(registry.as_ref()).await.unwrap();
    let id_template = templates.pk(ParameterKind::Id).unwrap();

    let gearbox = registry.insert_part("Gearbox", "GBX-001");
    registry.insert_parameter(gearbox, id_template, "x");
    registry
        .update_part(
            gearbox,
            &PartFields {
                assembly: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let stray = registry.insert_part("Stray", "STR-001");
    registry.create_bom_item(gearbox, stray, 4.0).await.unwrap();

    let engine = SyncEngine::new(
        registry.clone(),
        templates,
        Arc::new(snapshot),
        SyncOptions::default(),
    );
    run(&engine).await;

    assert!(registry.bom_of(gearbox).is_empty());
    assert!(!registry.part(gearbox).unwrap().assembly);
}

#[tokio::test]
async fn test_cycle_terminates_with_warning() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("a"),
        vec![
            node("a", "Gearbox", "GBX-001", &["b"]),
            node("b", "Housing", "HSG-001", &["a"]),
        ],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;

    let (warnings, transcript) = run(&engine).await;
    assert!(warnings);
    assert_eq!(registry.counters().create_part, 2);
    assert!(transcript
        .messages()
        .iter()
        .any(|m| m.level == MessageLevel::Warning && m.text.contains("contains itself")));
}

#[tokio::test]
async fn test_cancelled_run_fails_before_any_write() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Plate", "PLT-001", &[])],
    )
    .unwrap();
    let (registry, _, engine) = engine_for(snapshot).await;

    let runner = SyncRunner::new();
    let (handle, cancel) = CancelHandle::new();
    handle.cancel();
    let err = runner.run(&engine, cancel).await.expect_err("must cancel");
    assert!(matches!(err, SyncError::Cancelled));
    assert_eq!(registry.counters().create_part, 0);
}

/// Registry wrapper whose `create_part` blocks until released, so a test can
/// hold a run in flight deterministically.
struct GatedRegistry {
    inner: InMemoryRegistry,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl PartRegistry for GatedRegistry {
    async fn find_by_parameter(
        &self,
        template: i64,
        value: &str,
    ) -> Result<Vec<PartPk>, ApiError> {
        self.inner.find_by_parameter(template, value).await
    }
    async fn find_by_ipn(&self, ipn: &str) -> Result<Vec<Part>, ApiError> {
        self.inner.find_by_ipn(ipn).await
    }
    async fn create_part(&self, part: &NewPart) -> Result<Part, ApiError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.create_part(part).await
    }
    async fn update_part(&self, pk: PartPk, fields: &PartFields) -> Result<Part, ApiError> {
        self.inner.update_part(pk, fields).await
    }
    async fn get_part(&self, pk: PartPk) -> Result<Part, ApiError> {
        self.inner.get_part(pk).await
    }
    async fn list_bom_items(&self, part: PartPk) -> Result<Vec<BomItem>, ApiError> {
        self.inner.list_bom_items(part).await
    }
    async fn delete_bom_item(&self, pk: i64) -> Result<(), ApiError> {
        self.inner.delete_bom_item(pk).await
    }
    async fn create_bom_item(
        &self,
        part: PartPk,
        sub_part: PartPk,
        quantity: f64,
    ) -> Result<BomItem, ApiError> {
        self.inner.create_bom_item(part, sub_part, quantity).await
    }
    async fn list_parameters(&self, part: PartPk) -> Result<Vec<Parameter>, ApiError> {
        self.inner.list_parameters(part).await
    }
    async fn create_parameter(
        &self,
        part: PartPk,
        template: i64,
        data: &str,
    ) -> Result<Parameter, ApiError> {
        self.inner.create_parameter(part, template, data).await
    }
    async fn update_parameter(&self, pk: i64, data: &str) -> Result<Parameter, ApiError> {
        self.inner.update_parameter(pk, data).await
    }
    async fn list_templates(&self) -> Result<Vec<ParameterTemplate>, ApiError> {
        self.inner.list_templates().await
    }
    async fn create_template(
        &self,
        name: &str,
        units: &str,
    ) -> Result<ParameterTemplate, ApiError> {
        self.inner.create_template(name, units).await
    }
    async fn find_category(&self, name: &str) -> Result<Option<PartCategory>, ApiError> {
        self.inner.find_category(name).await
    }
}

#[tokio::test]
async fn test_second_concurrent_run_refused() {
    let snapshot = DesignSnapshot::new(
        ComponentId::from("x"),
        vec![node("x", "Plate", "PLT-001", &[])],
    )
    .unwrap();
    let registry = Arc::new(GatedRegistry {
        inner: InMemoryRegistry::new(),
        entered: Notify::new(),
        release: Notify::new(),
    });
    let templates = TemplateMap::initialize(registry.as_ref()).await.unwrap();
    let engine = Arc::new(SyncEngine::new(
        registry.clone(),
        templates,
        Arc::new(snapshot),
        SyncOptions::default(),
    ));
    let runner = Arc::new(SyncRunner::new());

    let first = {
        let runner = runner.clone();
        let engine = engine.clone();
        let (_handle, cancel) = CancelHandle::new();
        tokio::spawn(async move { runner.run(&engine, cancel).await })
    };

    // Wait until the first run is provably inside a registry call.
    registry.entered.notified().await;

    let (_handle, cancel) = CancelHandle::new();
    let err = runner.run(&engine, cancel).await.expect_err("must refuse");
    assert!(matches!(err, SyncError::AlreadyRunning));

    registry.release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert!(!report.warnings_raised);
}
