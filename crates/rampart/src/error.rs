//! Startup errors.

use rampart_config::ConfigError;
use rampart_core::SpecError;
use rampart_router::CompileError;
use rampart_server::ServerError;
use rampart_telemetry::TelemetryError;
use thiserror::Error;

/// Anything that prevents an application from starting or serving.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The specification document could not be read.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// The specification could not be compiled into routes.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The server failed to bind or serve.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// No specification was supplied to the builder.
    #[error("no API specification was provided")]
    MissingSpec,

    /// An endpoint requires authentication but no secret is configured.
    #[error("endpoint {endpoint} requires authentication but auth.jwt_secret is not set")]
    MissingJwtSecret {
        /// `METHOD /path` of the first such endpoint.
        endpoint: String,
    },
}
