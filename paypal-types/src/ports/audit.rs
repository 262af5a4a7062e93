//! Audit sink port for failure messages.

use crate::error::ErrorKind;

/// Receives one entry per failed facade call. Implementations must not fail.
pub trait AuditSink: Send + Sync {
    fn record(&self, operation: &'static str, kind: ErrorKind, message: &str);
}
