//! # FusionLink Settings
//!
//! Configuration loading, validation, and persistence for FusionLink.
//! A missing or invalid configuration blocks a sync run before any remote
//! call is made.

pub mod config;
pub mod error;

pub use config::{config_dir, default_path, Config, ServerSettings, SyncSettings};
pub use error::{SettingsError, SettingsResult};
