//! Port traits (interfaces for adapters).
//!
//! The facade depends on these traits, not on concrete implementations.

mod audit;
mod gateway;

pub use audit::AuditSink;
pub use gateway::{GatewayClient, HttpMethod};
