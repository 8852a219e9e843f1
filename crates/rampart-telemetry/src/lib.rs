//! # Rampart Telemetry
//!
//! Observability for Rampart services:
//!
//! - [`logging`]: structured JSON or pretty logs through `tracing-subscriber`
//! - [`metrics`]: Prometheus counters, histograms and gauges
//!
//! ```rust,ignore
//! use rampart_telemetry::{init_logging, init_metrics, LogConfig, MetricsConfig};
//!
//! init_logging(&LogConfig::default())?;
//! init_metrics(&MetricsConfig { enabled: true, ..Default::default() })?;
//! ```

#![doc(html_root_url = "https://docs.rs/rampart-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{fields, init_logging, LogConfig, LogFormat};
pub use metrics::{init_metrics, record_rejection, record_request, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
