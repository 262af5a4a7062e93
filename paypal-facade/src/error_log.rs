//! Append-only record of failure messages.

use std::sync::{Mutex, MutexGuard};

use paypal_types::{AuditSink, ErrorKind};

/// Ordered, append-only list of human-readable error messages.
///
/// Nothing in this crate ever clears it; it grows for the lifetime of the
/// facade that owns it.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<Vec<String>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<String>> {
        // A panic while pushing a String leaves the Vec intact.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, message: impl Into<String>) {
        self.entries().push(message.into());
    }

    /// Copy of all messages so far, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Lets one log collect failures from several facades.
impl AuditSink for ErrorLog {
    fn record(&self, operation: &'static str, kind: ErrorKind, message: &str) {
        self.push(format!("[{}] {}: {}", kind, operation, message));
    }
}
