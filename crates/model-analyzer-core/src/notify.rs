//! Status notifications for whoever hosts the pipeline.

use std::sync::Mutex;
use tracing::info;

/// Receives short progress messages (a status bar, a log, a test double).
pub trait Notifier: Send + Sync {
    fn status(&self, message: &str);
}

/// Logs status messages through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn status(&self, message: &str) {
        info!(status = %message, "Pipeline status");
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn status(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}
