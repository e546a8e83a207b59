// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! The configuration is built once at startup, either from the process
//! environment ([`Config::from_env`]) or from an arbitrary lookup function
//! ([`Config::from_lookup`]), and then shared read-only with every handler.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid allowed origin: {0:?}")]
    InvalidOrigin(String),

    #[error("Invalid mailbox address for {key}: {value:?}")]
    InvalidMailbox { key: &'static str, value: String },
}

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Maximum accepted request body in bytes (default: 100 KiB)
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// Cross-origin configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Outbound mail relay configuration
    #[serde(default)]
    pub mail: MailConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Allowed browser origins. An empty list allows any origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Per-client request budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per client per window (default: 20)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 60)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Number of reverse proxies whose X-Forwarded-For entry is trusted (default: 1)
    #[serde(default = "default_trust_proxy_hops")]
    pub trust_proxy_hops: usize,
}

/// Validation configuration for contact submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Accepted content types (default: application/json)
    #[serde(default = "default_content_types")]
    pub require_content_type: Vec<String>,
}

/// Outbound SMTP relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Relay account, also used as the sender address
    #[serde(default)]
    pub username: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// Destination mailbox; falls back to `username` when unset
    #[serde(default)]
    pub recipient: Option<String>,

    /// Display name of the sender mailbox (default: "Website Form")
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Upper bound on a single dispatch in seconds (default: 10)
    #[serde(default = "default_mail_timeout_secs")]
    pub timeout_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_body_limit() -> usize {
    100 * 1024
}

fn default_max_requests() -> u32 {
    20
}

fn default_window_secs() -> u64 {
    60
}

fn default_trust_proxy_hops() -> usize {
    1
}

fn default_content_types() -> Vec<String> {
    vec!["application/json".to_string()]
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465 // implicit TLS
}

fn default_sender_name() -> String {
    "Website Form".to_string()
}

fn default_mail_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            body_limit_bytes: default_body_limit(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            mail: MailConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            trust_proxy_hops: default_trust_proxy_hops(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_content_type: default_content_types(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            recipient: None,
            sender_name: default_sender_name(),
            timeout_secs: default_mail_timeout_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl RateLimitConfig {
    /// Get the rate window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl MailConfig {
    /// Mailbox that receives the notifications.
    pub fn recipient(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.username)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host: IpAddr = parse_var(var("BIND_HOST"), "BIND_HOST")?
            .unwrap_or(IpAddr::from([0, 0, 0, 0]));
        let port: u16 = parse_var(var("PORT"), "PORT")?.unwrap_or(8080);

        let allowed_origins = match var("ORIGIN") {
            Some(list) => parse_origins(&list)?,
            None => Vec::new(),
        };

        let username = var("SMTP_USER").ok_or(ConfigError::Missing("SMTP_USER"))?;
        check_mailbox("SMTP_USER", &username)?;
        let password = var("SMTP_PASS").ok_or(ConfigError::Missing("SMTP_PASS"))?;
        let recipient = var("TO_EMAIL");
        if let Some(to) = &recipient {
            check_mailbox("TO_EMAIL", to)?;
        }

        let mail = MailConfig {
            smtp_host: var("SMTP_HOST").unwrap_or_else(default_smtp_host),
            smtp_port: parse_var(var("SMTP_PORT"), "SMTP_PORT")?.unwrap_or_else(default_smtp_port),
            username,
            password,
            recipient,
            timeout_secs: parse_var(var("MAIL_TIMEOUT_SECS"), "MAIL_TIMEOUT_SECS")?
                .unwrap_or_else(default_mail_timeout_secs),
            ..Default::default()
        };

        let window_secs = parse_var(var("RATE_LIMIT_WINDOW_SECS"), "RATE_LIMIT_WINDOW_SECS")?
            .unwrap_or_else(default_window_secs);
        if !(1..=MAX_WINDOW_SECS).contains(&window_secs) {
            return Err(ConfigError::InvalidValue {
                key: "RATE_LIMIT_WINDOW_SECS",
                value: window_secs.to_string(),
            });
        }

        let rate_limit = RateLimitConfig {
            max_requests: parse_var(var("RATE_LIMIT_MAX"), "RATE_LIMIT_MAX")?
                .unwrap_or_else(default_max_requests),
            window_secs,
            trust_proxy_hops: parse_var(var("TRUST_PROXY_HOPS"), "TRUST_PROXY_HOPS")?
                .unwrap_or_else(default_trust_proxy_hops),
        };

        let metrics = MetricsConfig {
            enabled: parse_var(var("METRICS_ENABLED"), "METRICS_ENABLED")?
                .unwrap_or_else(default_true),
            ..Default::default()
        };

        Ok(Config {
            bind_addr: SocketAddr::new(host, port).to_string(),
            cors: CorsConfig { allowed_origins },
            rate_limit,
            mail,
            metrics,
            ..Default::default()
        })
    }
}

/// Longest accepted rate limit window (one day).
const MAX_WINDOW_SECS: u64 = 24 * 60 * 60;

fn parse_var<T: FromStr>(
    value: Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.parse()
                .map_err(|_| ConfigError::InvalidValue { key, value: v.clone() })
        })
        .transpose()
}

/// Split a comma-separated origin list. Each entry must be an http(s) origin.
fn parse_origins(list: &str) -> Result<Vec<String>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            let parsed =
                Url::parse(origin).map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(ConfigError::InvalidOrigin(origin.to_string()));
            }
            // Browsers send the origin without a trailing slash
            Ok(origin.trim_end_matches('/').to_string())
        })
        .collect()
}

fn check_mailbox(key: &'static str, value: &str) -> Result<(), ConfigError> {
    value
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidMailbox {
            key,
            value: value.to_string(),
        })
}
