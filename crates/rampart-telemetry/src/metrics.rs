//! Prometheus metrics.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `rampart_requests_total` | Counter | `route`, `method`, `status` |
//! | `rampart_request_duration_seconds` | Histogram | `route`, `method` |
//! | `rampart_requests_in_flight` | Gauge | - |
//! | `rampart_rejections_total` | Counter | `stage` |
//!
//! Recording functions are no-ops until a recorder is installed, so the
//! pipeline can call them unconditionally.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Request counter name.
pub const REQUESTS_TOTAL: &str = "rampart_requests_total";
/// Request duration histogram name.
pub const REQUEST_DURATION_SECONDS: &str = "rampart_request_duration_seconds";
/// In-flight gauge name.
pub const REQUESTS_IN_FLIGHT: &str = "rampart_requests_in_flight";
/// Rejection counter name.
pub const REJECTIONS_TOTAL: &str = "rampart_rejections_total";

/// Route label used for requests that matched no endpoint.
pub const UNMATCHED_ROUTE: &str = "unmatched";

static INSTALLED: OnceLock<SocketAddr> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the exporter is installed.
    pub enabled: bool,

    /// Address the scrape endpoint listens on.
    pub addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Installs the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime. Does nothing when metrics are
/// disabled.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for an unparsable address,
/// [`TelemetryError::AlreadyInitialized`] on a second call and
/// [`TelemetryError::MetricsInit`] if the exporter cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    if INSTALLED.set(addr).is_err() {
        return Err(TelemetryError::AlreadyInitialized("metrics"));
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();
    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests processed");
    describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP request duration in seconds");
    describe_gauge!(
        REQUESTS_IN_FLIGHT,
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        REJECTIONS_TOTAL,
        "Requests rejected before reaching a handler, by pipeline stage"
    );
}

/// Records a completed request.
pub fn record_request(route: &str, method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        REQUEST_DURATION_SECONDS,
        "route" => route.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a request rejected by a pipeline stage.
pub fn record_rejection(stage: &'static str) {
    counter!(REJECTIONS_TOTAL, "stage" => stage).increment(1);
}

/// Tracks one in-flight request for as long as it lives.
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(REQUESTS_IN_FLIGHT).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_disabled() {
        let config = MetricsConfig::default();
        assert!(!config.enabled);
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            enabled: true,
            addr: "not-an-address".to_string(),
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_recording_without_recorder() {
        record_request("/person/:id", "GET", 200, Duration::from_millis(3));
        record_rejection("authentication");
        let guard = InFlightGuard::new();
        drop(guard);
    }
}
