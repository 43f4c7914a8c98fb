//! # FusionLink
//!
//! Synchronize a Fusion360 assembly hierarchy with an InvenTree part
//! inventory: extract a bill of materials from an exported design snapshot,
//! reconcile each component against the server (create-if-missing, else
//! link), push physical metadata as typed parameters, and rebuild BOM
//! relationships recursively for assemblies.
//!
//! ## Architecture
//!
//! FusionLink is organized as a workspace with multiple crates:
//!
//! 1. **fusionlink-core** - Component tree model, snapshots, events, errors
//! 2. **fusionlink-inventree** - InvenTree wire model, REST client, templates
//! 3. **fusionlink-sync** - The recursive reconciliation engine and runner
//! 4. **fusionlink-settings** - Configuration loading and validation
//! 5. **fusionlink** - Command-line binary that integrates all crates

pub mod cli;

pub use fusionlink_core::{
    component_tree, flatten_bom, BomLine, ComponentData, ComponentId, ComponentSource,
    DesignSnapshot, Error, Message, MessageLevel, Result, SyncEvent, SyncEventDispatcher,
    Transcript, TreeNode,
};

pub use fusionlink_inventree::{
    InMemoryRegistry, InvenTreeClient, ParameterKind, Part, PartPk, PartRegistry, TemplateMap,
};

pub use fusionlink_settings::{Config, SettingsError};

pub use fusionlink_sync::{
    sync_status, CancelHandle, SyncEngine, SyncOptions, SyncReport, SyncRunner,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
