//! # PayPal Facade
//!
//! Payment service facade over the gateway client port: recurring billing
//! plans, billing agreements and one-off payments.
//!
//! ## Architecture
//!
//! - `service` - The facade (builds request bodies, interprets responses)
//! - `error_log` - Append-only record of failure messages
//!
//! The facade is generic over `G: GatewayClient`. [`build_facade`] wires it
//! to the reqwest-backed [`PaypalClient`].

mod error_log;
pub mod service;

#[cfg(test)]
mod service_tests;

use std::collections::HashMap;

use paypal_client::{PaypalClient, logging};
use paypal_types::{ConfigError, Credentials, FacadeError, GatewayConfig};

pub use error_log::ErrorLog;
pub use service::PaymentFacade;

const CLIENT_ID_VAR: &str = "PAYPAL_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "PAYPAL_CLIENT_SECRET";

/// Builds a facade from credentials and a flat configuration map.
///
/// Credentials are checked before anything else, so a missing id or secret
/// fails without touching the network or the log file.
pub fn build_facade(
    client_id: &str,
    client_secret: &str,
    config: &HashMap<String, String>,
) -> Result<PaymentFacade<PaypalClient>, FacadeError> {
    let credentials = Credentials::new(client_id, client_secret)?;
    let config = GatewayConfig::from_map(config)?;
    connect(credentials, &config)
}

/// Builds a facade from already-parsed configuration.
pub fn connect(
    credentials: Credentials,
    config: &GatewayConfig,
) -> Result<PaymentFacade<PaypalClient>, FacadeError> {
    let installed = logging::init(&config.log).map_err(|e| ConfigError::LogFile {
        path: config
            .log
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        message: e.to_string(),
    })?;
    if installed {
        tracing::info!("Logging at {} level", config.log.level.as_directive());
    }

    let client = PaypalClient::new(credentials, config)?;
    tracing::info!(
        "Payment facade ready ({} mode, {}, currency {})",
        config.mode,
        client.base_url(),
        config.currency
    );
    Ok(PaymentFacade::new(client, config.currency.clone()))
}

/// Builds a facade from `PAYPAL_*` environment variables, loading `.env`
/// first if present.
pub fn build_facade_from_env() -> Result<PaymentFacade<PaypalClient>, FacadeError> {
    dotenvy::dotenv().ok();

    let credentials = Credentials::from_parts(
        std::env::var(CLIENT_ID_VAR).ok(),
        std::env::var(CLIENT_SECRET_VAR).ok(),
    )?;
    let config = GatewayConfig::from_lookup(|key| std::env::var(key).ok())?;
    connect(credentials, &config)
}
