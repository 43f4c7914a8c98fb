//! Event system for sync progress reporting
//!
//! Provides:
//! - Event types covering a sync run's lifecycle
//! - Event dispatcher for publishing events to subscribers (UI shells,
//!   console renderers, test harnesses)

use tokio::sync::broadcast;

use crate::message::Message;

/// Sync run event types
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A run has started
    Started,
    /// The synchronizer began processing a component
    NodeStarted {
        /// Display name of the component.
        name: String,
    },
    /// A transcript message was appended
    Message(Message),
    /// The run finished; the full transcript is attached
    Completed {
        /// Whether any warning or error was raised anywhere in the run.
        warnings_raised: bool,
        /// The rendered transcript.
        transcript: String,
    },
    /// The run was aborted by an unrecoverable error
    Failed {
        /// The error description.
        error: String,
        /// The transcript accumulated up to the failure.
        transcript: String,
    },
}

impl std::fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncEvent::Started => write!(f, "Sync started"),
            SyncEvent::NodeStarted { name } => write!(f, "Synchronizing: {}", name),
            SyncEvent::Message(msg) => write!(f, "{}", msg),
            SyncEvent::Completed {
                warnings_raised, ..
            } => {
                if *warnings_raised {
                    write!(f, "Sync completed with warnings")
                } else {
                    write!(f, "Sync completed")
                }
            }
            SyncEvent::Failed { error, .. } => write!(f, "Sync failed: {}", error),
        }
    }
}

/// Event dispatcher for publishing sync events to subscribers
#[derive(Clone)]
pub struct SyncEventDispatcher {
    tx: broadcast::Sender<SyncEvent>,
}

impl SyncEventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 256)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Events published without any subscriber are dropped silently; a sync
    /// run must not fail because nobody is listening.
    pub fn publish(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SyncEventDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}
