//! Startup errors raised while compiling a specification.

use thiserror::Error;

/// Why a specification could not be compiled.
///
/// Every variant is fatal: the server must not start with a partial route
/// table.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A resource declares operations but no controller exists for it.
    #[error("no controller found for resource {path}")]
    ControllerNotFound {
        /// Structural path that was looked up.
        path: String,
    },

    /// The resolver failed for a reason other than "not found".
    #[error("failed to resolve controller for {path}: {source}")]
    Resolver {
        /// Structural path that was looked up.
        path: String,
        /// Resolver failure.
        #[source]
        source: anyhow::Error,
    },

    /// An operation names something that is not an HTTP method token.
    #[error("invalid HTTP method {method:?} on {path}")]
    InvalidMethod {
        /// The declared method.
        method: String,
        /// Route template of the resource.
        path: String,
    },

    /// A schema given as text is not valid JSON.
    #[error("malformed schema on {endpoint}: {source}")]
    MalformedSchema {
        /// `METHOD /path` of the endpoint.
        endpoint: String,
        /// JSON parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A schema document could not be compiled.
    #[error("invalid schema on {endpoint}: {source}")]
    InvalidSchema {
        /// `METHOD /path` of the endpoint.
        endpoint: String,
        /// Schema compile failure.
        #[source]
        source: rampart_core::SchemaError,
    },

    /// The route pattern could not be compiled.
    #[error("invalid route pattern for {path}: {source}")]
    InvalidPattern {
        /// Route template.
        path: String,
        /// Regex compile failure.
        #[source]
        source: regex::Error,
    },
}
