//! Notification collaborators.

use std::sync::{Arc, Mutex};

use keydeck_core::{Notifier, Severity};
use tracing::{error, info, warn};

/// Emits notifications as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => info!(target: "keydeck::notify", "{message}"),
            Severity::Warning => warn!(target: "keydeck::notify", "{message}"),
            Severity::Error => error!(target: "keydeck::notify", "{message}"),
        }
    }
}

/// Collects notifications in memory, in the order they were shown.
///
/// An optional downstream notifier sees every message as well.
#[derive(Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
    forward: Option<Arc<dyn Notifier>>,
}

impl std::fmt::Debug for MemoryNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNotifier")
            .field("messages", &self.messages)
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}

impl MemoryNotifier {
    /// Creates an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty notifier that also passes each message to `forward`.
    pub fn forwarding(forward: Arc<dyn Notifier>) -> Self {
        Self {
            messages: Mutex::default(),
            forward: Some(forward),
        }
    }

    /// Returns a copy of everything shown so far.
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Removes and returns everything shown so far.
    pub fn take(&self) -> Vec<(String, Severity)> {
        self.messages
            .lock()
            .map(|mut m| std::mem::take(&mut *m))
            .unwrap_or_default()
    }
}

impl Notifier for MemoryNotifier {
    fn show(&self, message: &str, severity: Severity) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((message.to_string(), severity));
        }
        if let Some(forward) = &self.forward {
            forward.show(message, severity);
        }
    }
}
