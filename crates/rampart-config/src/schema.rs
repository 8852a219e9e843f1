//! Configuration section types.
//!
//! Every section rejects unknown fields so typos fail loudly at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use rampart_telemetry::LogFormat;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind (e.g. `0.0.0.0:8080`).
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Upper bound on the time spent serving one request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long shutdown waits for in-flight connections.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Serve HTTP/2 alongside HTTP/1.1.
    #[serde(default)]
    pub http2_enabled: bool,

    /// Serve HTTPS with this certificate and key instead of plain HTTP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
            http2_enabled: false,
            tls: None,
        }
    }
}

/// PEM files for HTTPS. Both must exist when the section is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsConfig {
    /// Certificate chain, leaf first.
    pub cert_path: PathBuf,

    /// Private key (PKCS#8, PKCS#1 or SEC1).
    pub key_path: PathBuf,
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

// 180 minutes.
fn default_request_timeout() -> u64 {
    10_800
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// API surface settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Path prefix for every route. Overrides the spec's `baseUri`.
    #[serde(default)]
    pub base_path: Option<String>,

    /// Expose internal fault text in error responses.
    #[serde(default)]
    pub debug: bool,

    /// Check handler output against declared response schemas.
    #[serde(default)]
    pub validate_responses: bool,
}

/// Token authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared secret for HMAC-signed tokens.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Endpoint trait labels that require a bearer token.
    #[serde(default = "default_auth_traits")]
    pub traits: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            traits: default_auth_traits(),
        }
    }
}

fn default_auth_traits() -> Vec<String> {
    vec!["authenticated".to_string()]
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `rampart=debug,hyper=warn`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether the exporter runs.
    #[serde(default)]
    pub enabled: bool,

    /// Scrape listener address.
    #[serde(default = "default_metrics_addr")]
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.http_addr, "0.0.0.0:8080");
        assert_eq!(server.request_timeout_secs, 10_800);
        assert_eq!(server.max_body_bytes, 1_048_576);
        assert!(!server.http2_enabled);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let server: ServerConfig = toml::from_str("http_addr = \"127.0.0.1:1\"").unwrap();
        assert_eq!(server.http_addr, "127.0.0.1:1");
        assert_eq!(server.shutdown_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<AuthConfig, _> = toml::from_str("secret = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_defaults() {
        let auth = AuthConfig::default();
        assert!(auth.jwt_secret.is_none());
        assert_eq!(auth.traits, vec!["authenticated"]);
    }

    #[test]
    fn test_log_format_from_toml() {
        let logging: LoggingConfig = toml::from_str("format = \"pretty\"").unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert_eq!(logging.level, "info");
    }
}
