//! # FusionLink Sync
//!
//! The recursive BOM reconciliation engine: create-or-link matching against
//! the part registry, depth-first field and parameter synchronization,
//! clear-and-rebuild BOM maintenance, and the single-flight run wrapper.

pub mod engine;
pub mod matching;
pub mod runner;
pub mod status;

pub use engine::{SyncEngine, SyncOptions};
pub use matching::{resolve_existing, MatchOutcome, MissReason};
pub use runner::{CancelHandle, SyncReport, SyncRunner};
pub use status::sync_status;
