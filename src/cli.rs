//! Command-line surface
//!
//! Every command works on a design snapshot exported from the CAD host; the
//! commands that talk to the server additionally need a configuration file
//! with the server address and token.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use fusionlink_core::{component_tree, flatten_bom, ComponentSource, DesignSnapshot, SyncEvent};
use fusionlink_inventree::{InvenTreeClient, PartRegistry, TemplateMap};
use fusionlink_settings::Config;
use fusionlink_sync::{sync_status, CancelHandle, SyncEngine, SyncOptions, SyncRunner};

#[derive(Parser)]
#[command(name = "fusionlink", version, about = "Synchronize Fusion360 designs with InvenTree")]
pub struct Cli {
    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Synchronize a design snapshot with the InvenTree server
    Sync {
        /// Design snapshot exported from the CAD host (JSON)
        snapshot: PathBuf,
    },
    /// Print the flattened bill of materials of a snapshot
    Bom { snapshot: PathBuf },
    /// Print the bill of materials with per-component sync status
    Status { snapshot: PathBuf },
    /// Print the component hierarchy of a snapshot
    Tree { snapshot: PathBuf },
    /// Write a default configuration file
    InitConfig,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Sync { snapshot } => sync(&load_config(cli.config.as_deref())?, &snapshot).await,
        Command::Bom { snapshot } => bom(&snapshot),
        Command::Status { snapshot } => {
            status(&load_config(cli.config.as_deref())?, &snapshot).await
        }
        Command::Tree { snapshot } => tree(&snapshot),
        Command::InitConfig => init_config(cli.config.as_deref()),
    }
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(fusionlink_settings::default_path()?),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_path(explicit)?;
    Ok(Config::load_from_file(&path)?)
}

fn load_snapshot(path: &Path) -> anyhow::Result<DesignSnapshot> {
    DesignSnapshot::load_from_file(path)
        .with_context(|| format!("loading snapshot {}", path.display()))
}

async fn connect(config: &Config) -> anyhow::Result<(Arc<InvenTreeClient>, TemplateMap)> {
    let client = InvenTreeClient::with_timeout(
        &config.server.address,
        &config.server.token,
        std::time::Duration::from_millis(config.server.timeout_ms),
    )?;
    let templates = TemplateMap::initialize(&client).await?;
    Ok((Arc::new(client), templates))
}

async fn sync(config: &Config, snapshot: &Path) -> anyhow::Result<()> {
    let snapshot = Arc::new(load_snapshot(snapshot)?);
    let (client, templates) = connect(config).await?;

    let mut options = SyncOptions {
        category: None,
        default_name_prefixes: config.sync.default_name_prefixes.clone(),
    };
    if let Some(name) = &config.server.category {
        match client.find_category(name).await? {
            Some(category) => options.category = Some(category.pk),
            None => eprintln!("category '{}' not found on server, creating parts uncategorized", name),
        }
    }

    let engine = SyncEngine::new(client, templates, snapshot, options);
    let runner = SyncRunner::new();
    let (handle, cancel) = CancelHandle::new();

    tokio::spawn({
        let handle = handle.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("cancelling after the current component...");
                handle.cancel();
            }
        }
    });

    if config.sync.forward_progress {
        let mut events = runner.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    SyncEvent::NodeStarted { name } => eprintln!("  -> {}", name),
                    SyncEvent::Message(message) => eprintln!("     {}", message),
                    _ => {}
                }
            }
        });
    }

    let report = runner.run(&engine, cancel).await?;
    if !report.transcript.is_empty() {
        println!("{}", report.transcript);
    }
    if report.warnings_raised {
        println!("Sync completed with warnings");
    } else {
        println!("Sync completed");
    }
    Ok(())
}

fn bom(snapshot: &Path) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot)?;
    let root = snapshot.root();
    println!("{:<40} {:<20} {:>9}", "Name", "Part number", "Instances");
    for line in flatten_bom(&snapshot, &root) {
        println!(
            "{:<40} {:<20} {:>9}",
            line.name, line.part_number, line.instances
        );
    }
    Ok(())
}

async fn status(config: &Config, snapshot: &Path) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot)?;
    let root = snapshot.root();
    let lines = flatten_bom(&snapshot, &root);
    let (client, templates) = connect(config).await?;

    let ids: Vec<_> = lines.iter().map(|l| l.id.clone()).collect();
    let status = sync_status(client.as_ref(), &templates, &ids).await?;

    println!("{:<40} {:<20} {:>9}  Status", "Name", "Part number", "Instances");
    for line in lines {
        let state = match status.get(&line.id).and_then(|s| *s) {
            Some(pk) => format!("synced (part {})", pk),
            None => "not synced".to_string(),
        };
        println!(
            "{:<40} {:<20} {:>9}  {}",
            line.name, line.part_number, line.instances, state
        );
    }
    Ok(())
}

fn tree(snapshot: &Path) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot)?;
    let root = snapshot.root();
    for node in component_tree(&snapshot, &root) {
        let marker = if node.is_assembly { "+" } else { "-" };
        println!("{}{} {}", "  ".repeat(node.depth), marker, node.name);
    }
    Ok(())
}

fn init_config(explicit: Option<&Path>) -> anyhow::Result<()> {
    let path = config_path(explicit)?;
    if path.exists() {
        anyhow::bail!("configuration already exists at {}", path.display());
    }
    Config::default().save_to_file(&path)?;
    println!("wrote {}", path.display());
    println!("fill in the server address and token before running a sync");
    Ok(())
}
