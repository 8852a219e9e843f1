//! Error types for Rampart.
//!
//! Two error types cross the request pipeline:
//!
//! - [`ApiError`] is what a pipeline stage produces when it rejects a request.
//!   Every variant maps to a status code and renders into the error envelope.
//! - [`HandlerError`] is what user handlers return. It is either an explicit
//!   status-coded failure or an unexpected fault.
//!
//! Handlers that still raise faults shaped like `"403:forbidden resource"` are
//! honoured: [`HandlerError::into_api_error`] treats a `<digits>:<text>` fault
//! message as an explicit status-coded failure.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::envelope::ErrorEnvelope;

/// Generic message for uncaught handler faults.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Where in the request lifecycle an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No endpoint matched the request.
    Routing,
    /// The request violated the API contract (media type, body, schema).
    Contract,
    /// Credentials were missing or invalid.
    Authentication,
    /// A handler failed, explicitly or by fault.
    Handler,
    /// The server gave up on the request.
    Server,
}

impl ErrorCategory {
    /// Returns the label used for metrics and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Contract => "contract",
            Self::Authentication => "authentication",
            Self::Handler => "handler",
            Self::Server => "server",
        }
    }
}

/// A request rejection produced by the pipeline.
///
/// # Example
///
/// ```
/// use rampart_core::{ApiError, ErrorCategory};
/// use http::StatusCode;
///
/// let error = ApiError::unauthorized("Unauthorized");
/// assert_eq!(error.category(), ErrorCategory::Authentication);
/// assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
/// ```
#[derive(Error, Debug)]
pub enum ApiError {
    /// No endpoint matched the method and path.
    #[error("{message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// The request declared a media type other than JSON, or none at all.
    #[error("{message}")]
    UnsupportedMediaType {
        /// Human-readable error message.
        message: String,
    },

    /// The request body was missing, malformed or failed schema validation.
    #[error("{message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// The request body exceeded the configured limit.
    #[error("{message}")]
    PayloadTooLarge {
        /// Human-readable error message.
        message: String,
    },

    /// Authentication was required but no credentials were supplied, or the
    /// supplied token has expired.
    #[error("{message}")]
    Unauthorized {
        /// Human-readable error message.
        message: String,
    },

    /// The bearer token could not be decoded or lacks required claims.
    #[error("{message}")]
    InvalidToken {
        /// Human-readable error message.
        message: String,
    },

    /// A handler chose an explicit status and message.
    #[error("{message}")]
    Coded {
        /// Raw status value. Values outside the HTTP range map to 500.
        status: u16,
        /// Human-readable error message.
        message: String,
    },

    /// An uncaught handler fault.
    #[error("{message}")]
    Internal {
        /// Client-facing message.
        message: String,
        /// The underlying fault (never exposed unless debug mode is on).
        fault: Option<anyhow::Error>,
    },

    /// The server-level timeout elapsed.
    #[error("{message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },
}

impl ApiError {
    /// Creates a routing failure.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a media type failure.
    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            message: message.into(),
        }
    }

    /// Creates a body or schema failure.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a body size failure.
    #[must_use]
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge {
            message: message.into(),
        }
    }

    /// Creates a missing or expired credentials failure.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a malformed token failure.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates an explicit status-coded failure.
    #[must_use]
    pub fn coded(status: u16, message: impl Into<String>) -> Self {
        Self::Coded {
            status,
            message: message.into(),
        }
    }

    /// Creates an internal error with the generic message.
    #[must_use]
    pub fn internal(fault: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            fault: Some(fault.into()),
        }
    }

    /// Creates a timeout failure.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::Routing,
            Self::UnsupportedMediaType { .. }
            | Self::BadRequest { .. }
            | Self::PayloadTooLarge { .. } => ErrorCategory::Contract,
            Self::Unauthorized { .. } | Self::InvalidToken { .. } => {
                ErrorCategory::Authentication
            }
            Self::Coded { .. } | Self::Internal { .. } => ErrorCategory::Handler,
            Self::Timeout { .. } => ErrorCategory::Server,
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// A coded status that is not a valid HTTP status collapses to 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::BadRequest { .. } | Self::InvalidToken { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Coded { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::UnsupportedMediaType { message }
            | Self::BadRequest { message }
            | Self::PayloadTooLarge { message }
            | Self::Unauthorized { message }
            | Self::InvalidToken { message }
            | Self::Coded { message, .. }
            | Self::Internal { message, .. }
            | Self::Timeout { message } => message,
        }
    }

    /// Returns the underlying fault of an internal error.
    #[must_use]
    pub fn fault(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Internal { fault, .. } => fault.as_ref(),
            _ => None,
        }
    }

    /// Renders the error envelope.
    ///
    /// With `expose_faults` set, internal errors carry the fault text instead
    /// of the generic message.
    #[must_use]
    pub fn to_envelope(&self, expose_faults: bool) -> ErrorEnvelope {
        let message = match (expose_faults, self.fault()) {
            (true, Some(fault)) => fault.to_string(),
            _ => self.message().to_string(),
        };
        ErrorEnvelope::new(self.status_code().as_u16(), message)
    }
}

/// The failure type returned by handlers.
///
/// Any error convertible into [`anyhow::Error`] converts into
/// [`HandlerError::Fault`], so `?` works inside handlers.
///
/// # Example
///
/// ```
/// use rampart_core::HandlerError;
///
/// let explicit = HandlerError::status(403, "forbidden resource");
/// let legacy = HandlerError::from(anyhow::anyhow!("403:forbidden resource"));
///
/// let a = explicit.into_api_error();
/// let b = legacy.into_api_error();
/// assert_eq!(a.status_code(), b.status_code());
/// assert_eq!(a.message(), b.message());
/// ```
#[derive(Debug)]
pub enum HandlerError {
    /// An explicit failure with a chosen status and message.
    Status {
        /// HTTP status to respond with.
        status: u16,
        /// Message placed in the error envelope.
        message: String,
    },
    /// An unexpected fault.
    Fault(anyhow::Error),
}

impl HandlerError {
    /// Creates an explicit status-coded failure.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 failure.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(400, message)
    }

    /// Creates a 403 failure.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::status(403, message)
    }

    /// Creates a 404 failure.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(404, message)
    }

    /// Converts the failure into a pipeline error.
    ///
    /// Faults whose message has the form `<digits>:<text>` become explicit
    /// coded failures. Every other fault becomes an internal error.
    #[must_use]
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Status { status, message } => ApiError::coded(status, message),
            Self::Fault(fault) => {
                let text = fault.to_string();
                match parse_coded_message(&text) {
                    Some((status, message)) => ApiError::coded(status, message),
                    None => ApiError::internal(fault),
                }
            }
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "{status}:{message}"),
            Self::Fault(fault) => write!(f, "{fault}"),
        }
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self::Fault(error.into())
    }
}

/// Splits a `<digits>:<text>` message into status and text.
///
/// A digit prefix too large for a status code resolves to 500.
#[must_use]
pub fn parse_coded_message(message: &str) -> Option<(u16, &str)> {
    let (code, text) = message.split_once(':')?;
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let status = code.parse::<u16>().unwrap_or(500);
    Some((status, text))
}
