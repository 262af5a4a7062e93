//! # PayPal Types
//!
//! Domain types, configuration and port traits for the PayPal payment facade.
//! This crate performs no IO: request values, the configuration map parser,
//! error types and trait definitions only.
//!
//! - `domain/` - Plans, agreements, payments, money and credentials
//! - `ports/` - `GatewayClient` and `AuditSink` traits
//! - `config` - Configuration map parsing
//! - `error` - Domain, gateway and facade error types

pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use config::{CacheConfig, ConfigError, GatewayConfig, LogConfig, LogLevel, Mode};
pub use domain::*;
pub use error::{DomainError, ErrorKind, FacadeError, GatewayError};
pub use ports::{AuditSink, GatewayClient, HttpMethod};
