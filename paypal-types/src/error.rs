//! Error types for the payment facade.

use std::fmt;

use crate::config::ConfigError;

/// Domain-level errors (value construction rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Client id and client secret are required")]
    MissingCredentials,

    #[error("Amount overflow")]
    Overflow,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Errors raised at the gateway client boundary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never got a response (DNS, TLS, timeout, refused).
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider answered with a non-success status.
    #[error("API error: {status} {name} - {message}")]
    Api {
        status: u16,
        name: String,
        message: String,
        debug_id: Option<String>,
    },

    /// The provider answered, but the body was not what we expected.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Gateway configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

/// Coarse classification of a failure, for callers that branch on cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network or transport failure.
    Connection,
    /// The provider rejected the request (validation, auth, rate limit).
    Api,
    /// A rule of this crate failed (plan not found, missing field).
    Logic,
    /// Missing credentials or an invalid configuration map.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connection => write!(f, "CONNECTION"),
            ErrorKind::Api => write!(f, "API"),
            ErrorKind::Logic => write!(f, "LOGIC"),
            ErrorKind::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// Errors returned by facade operations.
#[derive(Debug, thiserror::Error)]
pub enum FacadeError {
    #[error("Client id and client secret are required")]
    MissingCredentials,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Domain(DomainError),

    #[error("No active plan named {0:?}")]
    PlanNotFound(String),

    #[error("Provider response is missing {0}")]
    MissingField(&'static str),

    /// A multi-step operation failed after an earlier step already changed
    /// provider-side state. `plan_id` identifies what needs reconciling.
    #[error("Plan {plan_id} was created but could not be activated: {source}")]
    PartialFailure {
        plan_id: String,
        #[source]
        source: GatewayError,
    },
}

impl From<DomainError> for FacadeError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MissingCredentials => FacadeError::MissingCredentials,
            e => FacadeError::Domain(e),
        }
    }
}

impl FacadeError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FacadeError::MissingCredentials | FacadeError::Config(_) => ErrorKind::Configuration,
            FacadeError::Gateway(e) | FacadeError::PartialFailure { source: e, .. } => match e {
                GatewayError::Connection(_) => ErrorKind::Connection,
                GatewayError::Api { .. } | GatewayError::Decode(_) => ErrorKind::Api,
                GatewayError::Config(_) => ErrorKind::Configuration,
            },
            FacadeError::Domain(_) | FacadeError::PlanNotFound(_) | FacadeError::MissingField(_) => {
                ErrorKind::Logic
            }
        }
    }

    /// Returns true if provider-side state was changed before the failure.
    pub fn is_partial(&self) -> bool {
        matches!(self, FacadeError::PartialFailure { .. })
    }
}
