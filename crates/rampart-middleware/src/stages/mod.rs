//! Pipeline stages.
//!
//! In execution order:
//!
//! 1. [`request_id`]: generate or propagate the request ID
//! 2. [`telemetry`]: request span, metrics and completion log
//! 3. [`routing`]: endpoint lookup (404)
//! 4. [`content_type`]: JSON media type guard (415)
//! 5. [`validation`]: request body schema validation (400)
//! 6. [`authentication`]: trait-based JWT check (401/400)
//! 7. [`invoke`]: handler fault boundary and response normalization

pub mod authentication;
pub mod content_type;
pub mod invoke;
pub mod request_id;
pub mod routing;
pub mod telemetry;
pub mod validation;

pub use authentication::{AuthenticationMiddleware, JwtVerifier};
pub use content_type::ContentTypeMiddleware;
pub use invoke::HandlerInvoker;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use routing::RoutingMiddleware;
pub use telemetry::TelemetryMiddleware;
pub use validation::ValidationMiddleware;
