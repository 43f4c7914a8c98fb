//! Run wrapper around the engine
//!
//! Owns the event dispatcher and the single-flight guard: at most one sync
//! run is in progress at a time, since two runs racing the create-or-link
//! logic could create duplicate parts. Also provides cooperative
//! cancellation, checked by the engine at every component boundary.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

use fusionlink_core::{SyncError, SyncEvent, SyncEventDispatcher, Transcript};

use crate::engine::SyncEngine;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Whether any warning or error was raised during the run
    pub warnings_raised: bool,
    /// The rendered transcript
    pub transcript: String,
}

/// Handle for cancelling an in-flight run
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Create a handle and the receiver a run observes
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Request cancellation; the run stops at the next component boundary
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Executes sync runs one at a time, streaming progress as events
pub struct SyncRunner {
    dispatcher: SyncEventDispatcher,
    guard: Arc<Mutex<()>>,
}

impl SyncRunner {
    pub fn new() -> Self {
        Self {
            dispatcher: SyncEventDispatcher::default(),
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// The dispatcher runs publish progress through
    pub fn dispatcher(&self) -> &SyncEventDispatcher {
        &self.dispatcher
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SyncEvent> {
        self.dispatcher.subscribe()
    }

    /// Execute one run to completion
    ///
    /// Refuses with [`SyncError::AlreadyRunning`] if a run is in flight.
    /// The final transcript is delivered in the terminal event whether the
    /// run completed or failed.
    pub async fn run(
        &self,
        engine: &SyncEngine,
        cancel: watch::Receiver<bool>,
    ) -> Result<SyncReport, SyncError> {
        let _running = self
            .guard
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let run_id = Uuid::new_v4();
        info!(%run_id, "starting sync run");
        self.dispatcher.publish(SyncEvent::Started);
        let transcript = Transcript::new();

        match engine.sync_tree(&transcript, &self.dispatcher, &cancel).await {
            Ok(warnings_raised) => {
                let report = SyncReport {
                    warnings_raised,
                    transcript: transcript.render(),
                };
                info!(%run_id, warnings = warnings_raised, "sync run completed");
                self.dispatcher.publish(SyncEvent::Completed {
                    warnings_raised,
                    transcript: report.transcript.clone(),
                });
                Ok(report)
            }
            Err(err) => {
                warn!(%run_id, "sync run failed: {}", err);
                self.dispatcher.publish(SyncEvent::Failed {
                    error: err.to_string(),
                    transcript: transcript.render(),
                });
                Err(err)
            }
        }
    }
}

impl Default for SyncRunner {
    fn default() -> Self {
        Self::new()
    }
}
