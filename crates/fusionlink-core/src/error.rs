//! Error handling for FusionLink
//!
//! Provides error types for all layers of the application:
//! - Registry errors (remote InvenTree API)
//! - Snapshot errors (design snapshot loading/validation)
//! - Sync errors (reconciliation engine)
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::collections::BTreeMap;

use thiserror::Error;

/// Remote registry API error type
///
/// Represents failures while talking to the InvenTree server: transport
/// problems, unexpected status codes, and field-level validation rejects.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server base URL could not be parsed or joined
    #[error("Invalid server URL: {url}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
    },

    /// Transport-level failure (connection refused, DNS, TLS, timeout)
    #[error("HTTP transport error: {reason}")]
    Transport {
        /// The reason reported by the HTTP client.
        reason: String,
    },

    /// The server answered with an unexpected status code
    #[error("Server returned {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The (possibly truncated) response body.
        body: String,
    },

    /// The server rejected a payload with field-level validation errors
    #[error("Validation failed: {}", format_validation(.fields))]
    Validation {
        /// Field name to list of validation messages.
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The response body could not be decoded
    #[error("Failed to decode server response: {reason}")]
    Decode {
        /// The reason decoding failed.
        reason: String,
    },

    /// Authentication was rejected
    #[error("Authentication rejected by server")]
    Unauthorized,

    /// A referenced remote object does not exist
    #[error("Remote object not found: {what}")]
    NotFound {
        /// A description of the missing object.
        what: String,
    },

    /// A required parameter template is missing on the server
    #[error("Parameter template '{name}' missing after initialization")]
    MissingTemplate {
        /// The template name.
        name: String,
    },
}

fn format_validation(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Design snapshot error type
///
/// Represents errors loading or validating an exported component tree.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot file could not be read
    #[error("Failed to read snapshot {path}: {reason}")]
    Read {
        /// The snapshot path.
        path: String,
        /// The reason reading failed.
        reason: String,
    },

    /// The snapshot content is not valid JSON
    #[error("Invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The declared root component is missing from the node table
    #[error("Snapshot root component '{id}' not present")]
    MissingRoot {
        /// The missing root id.
        id: String,
    },

    /// An occurrence references a component not present in the node table
    #[error("Component '{parent}' references unknown child '{child}'")]
    DanglingOccurrence {
        /// The referencing component id.
        parent: String,
        /// The missing child id.
        child: String,
    },
}

/// Synchronization error type
///
/// Failures of the reconciliation run itself, as opposed to individual
/// per-node warnings which are reported through the transcript.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A sync run is already in progress
    #[error("A sync run is already in progress")]
    AlreadyRunning,

    /// The run was cancelled cooperatively
    #[error("Sync run cancelled")]
    Cancelled,

    /// The root component is unknown to the component source
    #[error("Root component '{id}' not found in design")]
    RootNotFound {
        /// The root id that was requested.
        id: String,
    },

    /// A registry call failed; the run is aborted
    #[error(transparent)]
    Registry(#[from] ApiError),
}

/// Main error type for FusionLink
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote registry error
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Snapshot error
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Sync error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a remote registry error
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api(_) | Error::Sync(SyncError::Registry(_)))
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Sync(SyncError::Cancelled))
    }

    /// Check if this is a snapshot error
    pub fn is_snapshot_error(&self) -> bool {
        matches!(self, Error::Snapshot(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
