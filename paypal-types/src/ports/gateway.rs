//! Gateway client port.
//!
//! The facade talks to the payment provider only through this trait.
//! The HTTP adapter lives in `paypal-client`; tests use scripted mocks.

use serde_json::Value;
use std::fmt;

use crate::domain::{AccessToken, Credentials};
use crate::error::GatewayError;

/// HTTP verbs used against the provider's REST resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// Port trait for authenticated calls to the payment provider.
#[async_trait::async_trait]
pub trait GatewayClient: Send + Sync + 'static {
    /// Exchanges credentials for an access token.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, GatewayError>;

    /// Sends an authenticated request.
    ///
    /// `resource` is a path relative to the API root, optionally with a
    /// query string (`/v1/payments/billing-plans?page_size=2`). An empty
    /// success body is returned as `Value::Null`.
    async fn request(
        &self,
        method: HttpMethod,
        resource: &str,
        body: Option<Value>,
    ) -> Result<Value, GatewayError>;
}
