//! # Rampart Core
//!
//! Core types and traits for the Rampart framework.
//!
//! - [`ApiSpec`] / [`ResourceNode`] / [`Operation`] - the parsed specification tree
//! - [`EndpointRecord`] - a compiled, routable endpoint
//! - [`Handler`] / [`HandlerSet`] - business logic keyed by HTTP method
//! - [`RequestContext`] - per-request state handed to handlers
//! - [`JsonSchema`] - request/response body validation
//! - [`Claims`] - decoded bearer token claims
//! - [`ApiError`] / [`HandlerError`] - the error taxonomy and envelopes

#![doc(html_root_url = "https://docs.rs/rampart-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod endpoint;
pub mod envelope;
mod error;
mod handler;
mod params;
pub mod schema;
pub mod spec;
mod token;

pub use context::{RequestContext, RequestId};
pub use endpoint::EndpointRecord;
pub use envelope::{ErrorEnvelope, SuccessEnvelope};
pub use error::{
    parse_coded_message, ApiError, ApiResult, ErrorCategory, HandlerError, INTERNAL_ERROR_MESSAGE,
};
pub use handler::{handler_fn, BoxFuture, FnHandler, Handler, HandlerResult, HandlerSet};
pub use params::PathParams;
pub use schema::{JsonSchema, SchemaError, ValidationResult};
pub use spec::{ApiSpec, Operation, ResourceNode, SchemaSource, SpecError};
pub use token::{Claims, ClaimsError};
