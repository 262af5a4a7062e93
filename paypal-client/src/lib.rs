//! # PayPal Client
//!
//! reqwest-backed implementation of the [`GatewayClient`] port.
//!
//! The client is bound to one set of credentials at construction. It fetches
//! an OAuth2 client-credentials token on first use, reuses it until it
//! expires and, when `cache.enabled` is set, persists it to `cache.file`.

pub mod logging;
mod token_cache;

use async_trait::async_trait;
use chrono::Utc;
use paypal_types::{AccessToken, Credentials, GatewayClient, GatewayConfig, GatewayError, HttpMethod};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

pub use token_cache::TokenCache;

const TOKEN_PATH: &str = "/v1/oauth2/token";
const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
    #[serde(default)]
    app_id: Option<String>,
}

/// Error body of the REST API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    debug_id: Option<String>,
    // OAuth endpoint spelling
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// PayPal REST gateway client.
pub struct PaypalClient {
    base_url: String,
    credentials: Credentials,
    http: Client,
    token: Mutex<Option<AccessToken>>,
    cache: Option<TokenCache>,
}

impl PaypalClient {
    /// Creates a client bound to `credentials`. Performs no network IO.
    pub fn new(credentials: Credentials, config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let cache = config
            .cache
            .enabled
            .then(|| TokenCache::new(config.cache.file.clone()));

        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            credentials,
            http,
            token: Mutex::new(None),
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns a valid token: in-memory first, then the file cache, then a
    /// fresh one from the token endpoint.
    async fn access_token(&self) -> Result<AccessToken, GatewayError> {
        let mut current = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = current.as_ref().filter(|t| !t.is_expired(now)) {
            return Ok(token.clone());
        }

        if let Some(cache) = &self.cache {
            if let Some(token) = cache.load(self.credentials.client_id()).await {
                if !token.is_expired(now) {
                    tracing::debug!("Using cached access token from {}", cache.path().display());
                    *current = Some(token.clone());
                    return Ok(token);
                }
            }
        }

        let token = self.authenticate(&self.credentials).await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(self.credentials.client_id(), &token).await {
                tracing::warn!("Cannot write token cache {}: {}", cache.path().display(), e);
            }
        }
        *current = Some(token.clone());
        Ok(token)
    }

    /// Forgets the current token, in memory and in the file cache, so the
    /// next call fetches a fresh one.
    async fn invalidate_token(&self) {
        self.token.lock().await.take();
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.evict(self.credentials.client_id()).await {
                tracing::warn!("Cannot update token cache {}: {}", cache.path().display(), e);
            }
        }
    }

    async fn error_from_response(resp: reqwest::Response) -> GatewayError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();

        let (name, message, debug_id) = match parsed {
            Some(b) => (
                b.name.or(b.error),
                b.message.or(b.error_description),
                b.debug_id,
            ),
            None => (None, None, None),
        };

        GatewayError::Api {
            status: status.as_u16(),
            name: name.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("UNKNOWN_ERROR")
                    .to_string()
            }),
            message: message.unwrap_or(body),
            debug_id,
        }
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Decode(err.to_string())
    } else {
        GatewayError::Connection(err.to_string())
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
    }
}

#[async_trait]
impl GatewayClient for PaypalClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken, GatewayError> {
        tracing::info!("Requesting access token for client {}", credentials.client_id());

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, TOKEN_PATH))
            .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }

        let body: TokenResponse = resp.json().await.map_err(transport_error)?;
        let mut token = AccessToken::new(
            body.access_token,
            body.token_type,
            body.expires_in,
            Utc::now(),
        );
        token.app_id = body.app_id;
        Ok(token)
    }

    #[tracing::instrument(skip(self, body))]
    async fn request(
        &self,
        method: HttpMethod,
        resource: &str,
        body: Option<Value>,
    ) -> Result<Value, GatewayError> {
        let token = self.access_token().await?;

        let mut req = self
            .http
            .request(to_reqwest(method), format!("{}{}", self.base_url, resource))
            .header(reqwest::header::AUTHORIZATION, token.authorization())
            .header(reqwest::header::ACCEPT, "application/json");
        if method == HttpMethod::Post {
            req = req.header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());
        }
        if let Some(body) = &body {
            req = req.json(body);
        }

        tracing::debug!("{} {}", method, resource);
        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_token().await;
        }
        if !status.is_success() {
            let err = Self::error_from_response(resp).await;
            tracing::debug!("{} {} failed: {}", method, resource, err);
            return Err(err);
        }

        let text = resp.text().await.map_err(transport_error)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
