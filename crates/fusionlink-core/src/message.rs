//! Run messages and the transcript accumulator
//!
//! Every sync run produces a transcript: an append-only list of leveled,
//! human-readable messages that is streamed incrementally while the run is
//! in flight and rendered once as a summary when it ends.

use std::sync::Arc;

use parking_lot::RwLock;

/// Severity of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageLevel {
    /// Progress and informational output
    Info,
    /// Something was skipped or corrected; the run continues
    Warning,
    /// A subtree was abandoned; the run continues elsewhere
    Error,
}

impl std::fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Severity
    pub level: MessageLevel,
    /// Human-readable text
    pub text: String,
}

impl Message {
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageLevel::Error, text)
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.text)
    }
}

/// Shared append-only message accumulator for one run
///
/// Cloned handles all append to the same underlying list; the transcript is
/// shared across every recursive call of a run, never copied per branch.
#[derive(Clone, Default)]
pub struct Transcript {
    entries: Arc<RwLock<Vec<Message>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&self, message: Message) {
        self.entries.write().push(message);
    }

    /// All messages appended so far
    pub fn messages(&self) -> Vec<Message> {
        self.entries.read().clone()
    }

    /// Whether any warning or error has been appended
    pub fn warnings_raised(&self) -> bool {
        self.entries
            .read()
            .iter()
            .any(|m| m.level >= MessageLevel::Warning)
    }

    /// Number of messages appended so far
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Render the transcript as a newline-separated summary
    pub fn render(&self) -> String {
        self.entries
            .read()
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_display() {
        let msg = Message::warning("no part number set on 'Bracket'");
        assert_eq!(msg.to_string(), "[WARN] no part number set on 'Bracket'");
    }

    #[test]
    fn test_transcript_warning_detection() {
        let transcript = Transcript::new();
        transcript.push(Message::info("synchronizing 'Frame'"));
        assert!(!transcript.warnings_raised());

        transcript.push(Message::warning("skipped child 'Bolt'"));
        assert!(transcript.warnings_raised());
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_transcript_shared_between_clones() {
        let transcript = Transcript::new();
        let clone = transcript.clone();
        clone.push(Message::info("one"));
        transcript.push(Message::info("two"));
        assert_eq!(clone.len(), 2);
        assert_eq!(transcript.render(), "[INFO] one\n[INFO] two");
    }
}
