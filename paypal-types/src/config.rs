//! Configuration map parsing.
//!
//! The facade is configured once, from a flat string map:
//!
//! | key | values | default |
//! |-----|--------|---------|
//! | `mode` | `sandbox` \| `live` | `sandbox` |
//! | `log.enabled` | bool | `false` |
//! | `log.file` | path | stderr |
//! | `log.level` | `DEBUG` \| `INFO` \| `WARN` \| `ERROR` | `INFO` |
//! | `cache.enabled` | bool | `false` |
//! | `cache.file` | path | `auth.cache/cachefile` |
//! | `http.timeout` | seconds | `30` |
//! | `service.endpoint` | base URL | per mode |
//! | `currency` | ISO code | `AUD` |
//!
//! Keys are matched case-insensitively, and the legacy SDK spellings
//! (`log.LogEnabled`, `log.FileName`, `log.LogLevel`, `cache.FileName`) are
//! accepted as aliases.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::CurrencyCode;

const SANDBOX_ENDPOINT: &str = "https://api-m.sandbox.paypal.com";
const LIVE_ENDPOINT: &str = "https://api-m.paypal.com";
const DEFAULT_CACHE_FILE: &str = "auth.cache/cachefile";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors from parsing the configuration map.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for config key {key}")]
    InvalidValue { key: String, value: String },

    #[error("Cannot open log file {path}: {message}")]
    LogFile { path: String, message: String },
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Which provider environment requests go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Sandbox,
    Live,
}

impl Mode {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Mode::Sandbox => SANDBOX_ENDPOINT,
            Mode::Live => LIVE_ENDPOINT,
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sandbox" => Ok(Mode::Sandbox),
            "live" => Ok(Mode::Live),
            _ => Err(invalid("mode", s)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sandbox => write!(f, "sandbox"),
            Mode::Live => write!(f, "live"),
        }
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing` filters.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" | "FINE" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(invalid("log.level", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub enabled: bool,
    /// Log file; `None` writes to stderr.
    pub file: Option<PathBuf>,
    pub level: LogLevel,
}

/// Persistent auth-token cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub file: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            file: PathBuf::from(DEFAULT_CACHE_FILE),
        }
    }
}

/// Everything the gateway client and facade are configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub mode: Mode,
    pub log: LogConfig,
    pub cache: CacheConfig,
    pub timeout: Duration,
    /// Base URL override; defaults to the mode's endpoint.
    pub endpoint: Option<String>,
    pub currency: CurrencyCode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            log: LogConfig::default(),
            cache: CacheConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            endpoint: None,
            currency: CurrencyCode::default(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

impl GatewayConfig {
    /// Parses the configuration map. Unknown keys are ignored with a warning.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (raw_key, value) in map {
            let key = raw_key.trim().to_lowercase();
            match key.as_str() {
                "mode" => config.mode = value.parse()?,
                "log.enabled" | "log.logenabled" => {
                    config.log.enabled = parse_bool(raw_key, value)?
                }
                "log.file" | "log.filename" => {
                    config.log.file = (!value.trim().is_empty()).then(|| PathBuf::from(value))
                }
                "log.level" | "log.loglevel" => config.log.level = value.parse()?,
                "cache.enabled" => config.cache.enabled = parse_bool(raw_key, value)?,
                "cache.file" | "cache.filename" => config.cache.file = PathBuf::from(value),
                "http.timeout" | "http.connectiontimeout" => {
                    let secs: u64 = value.trim().parse().map_err(|_| invalid(raw_key, value))?;
                    config.timeout = Duration::from_secs(secs);
                }
                "service.endpoint" => {
                    config.endpoint =
                        Some(value.trim().trim_end_matches('/').to_string())
                }
                "currency" => config.currency = CurrencyCode::new(value),
                _ => tracing::warn!("Ignoring unknown config key {}", raw_key),
            }
        }

        Ok(config)
    }

    /// Reads the same options from `PAYPAL_*` variables, e.g.
    /// `PAYPAL_MODE`, `PAYPAL_LOG_LEVEL`, `PAYPAL_CACHE_FILE`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        const KEYS: [&str; 9] = [
            "mode",
            "log.enabled",
            "log.file",
            "log.level",
            "cache.enabled",
            "cache.file",
            "http.timeout",
            "service.endpoint",
            "currency",
        ];

        let map: HashMap<String, String> = KEYS
            .iter()
            .filter_map(|key| {
                let var = format!("PAYPAL_{}", key.replace('.', "_").to_uppercase());
                lookup(&var).map(|value| (key.to_string(), value))
            })
            .collect();

        Self::from_map(&map)
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.mode.endpoint())
    }
}
