//! Error normalization.
//!
//! Every rejection in the pipeline, from routing to the handler boundary, is
//! rendered here so clients always see the same envelope:
//!
//! ```json
//! { "status": 415, "message": "Content-type 'text/plain' not supported", "data": {} }
//! ```

use http::StatusCode;
use rampart_core::{ApiError, ErrorEnvelope};

use crate::types::{Response, ResponseExt};

const FALLBACK_BODY: &str = r#"{"status":500,"message":"An internal error occurred","data":{}}"#;

/// Renders [`ApiError`]s as JSON error envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMapper {
    expose_internal_errors: bool,
}

impl ErrorMapper {
    /// Creates a mapper that hides internal fault details.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapper that substitutes the fault text for the generic
    /// internal error message. Meant for debug deployments.
    #[must_use]
    pub fn exposing_internal_errors() -> Self {
        Self {
            expose_internal_errors: true,
        }
    }

    /// Whether internal fault details are exposed.
    #[must_use]
    pub fn exposes_internal_errors(&self) -> bool {
        self.expose_internal_errors
    }

    /// Builds the envelope for an error.
    #[must_use]
    pub fn envelope(&self, error: &ApiError) -> ErrorEnvelope {
        error.to_envelope(self.expose_internal_errors)
    }

    /// Builds the error response.
    #[must_use]
    pub fn map(&self, error: &ApiError) -> Response {
        let status = error.status_code();
        match Response::json(status, &self.envelope(error)) {
            Ok(response) => response,
            Err(_) => Response::json_bytes(
                StatusCode::INTERNAL_SERVER_ERROR,
                FALLBACK_BODY.as_bytes().to_vec(),
            ),
        }
    }
}
