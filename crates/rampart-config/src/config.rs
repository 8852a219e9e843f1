//! The top-level [`RampartConfig`].

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::{ApiConfig, AuthConfig, ConfigError, LogFormat, LoggingConfig, MetricsConfig, ServerConfig};

/// Complete service configuration.
///
/// # Example
///
/// ```
/// use rampart_config::RampartConfig;
///
/// let config = RampartConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RampartConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// API surface settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Token authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl RampartConfig {
    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        if let Some(tls) = &self.server.tls {
            for (field, path) in [
                ("server.tls.cert_path", &tls.cert_path),
                ("server.tls.key_path", &tls.key_path),
            ] {
                if !path.is_file() {
                    return Err(ConfigError::TlsFileNotFound {
                        field: field.to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        if self.metrics.enabled && self.metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "metrics.addr",
                format!("invalid socket address: {}", self.metrics.addr),
            ));
        }

        if let Err(e) = rampart_telemetry::logging::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        if self.auth.jwt_secret.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::invalid_value("auth.jwt_secret", "must not be empty"));
        }

        if let Some(base_path) = &self.api.base_path {
            if !base_path.is_empty() && !base_path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "api.base_path",
                    format!("must start with '/': {base_path}"),
                ));
            }
        }

        Ok(())
    }

    /// Human-readable logs at debug level with fault details exposed.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.api.debug = true;
        config.api.validate_responses = true;
        config
    }

    /// The socket address to bind. Only valid after [`validate`](Self::validate).
    pub fn http_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            )
        })
    }
}
