//! Warning sinks for core operations
//!
//! Core logic never reaches for a process-wide logger when it has something
//! to tell the user. It reports through a [`LogSink`] handed in by the
//! caller; the CLI passes [`TracingSink`], tests pass [`RecordingSink`].

use std::sync::Mutex;
use tracing::warn;

/// Destination for user-facing warnings
pub trait LogSink: Send + Sync {
    /// Report a non-fatal warning
    fn warn(&self, message: &str);
}

/// Forwards warnings to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn warn(&self, message: &str) {
        warn!("{}", message);
    }
}

/// Keeps every warning in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings recorded so far, oldest first
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl LogSink for RecordingSink {
    fn warn(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
