//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries what earlier stages learned about a
//! request (its id, the matched endpoint, path parameters, the parsed body
//! and token claims) to later stages and finally into the handler's
//! [`RequestContext`](rampart_core::RequestContext). Values a custom stage
//! stores with [`MiddlewareContext::set_extension`] reach the handler too.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Extensions;
use rampart_core::{Claims, EndpointRecord, PathParams, RequestId};
use serde_json::Value;

/// Context passed through the middleware pipeline.
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    endpoint: Option<Arc<EndpointRecord>>,
    params: PathParams,
    body: Option<Value>,
    token: Option<Claims>,
    started_at: Instant,
    extensions: Extensions,
}

/// What the handler's context is built from.
#[derive(Debug, Default)]
pub(crate) struct HandlerInputs {
    pub(crate) endpoint: Option<Arc<EndpointRecord>>,
    pub(crate) params: PathParams,
    pub(crate) body: Option<Value>,
    pub(crate) token: Option<Claims>,
    pub(crate) extensions: Extensions,
}

impl MiddlewareContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            endpoint: None,
            params: PathParams::new(),
            body: None,
            token: None,
            started_at: Instant::now(),
            extensions: Extensions::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the matched endpoint, once routing has run.
    #[must_use]
    pub fn endpoint(&self) -> Option<&Arc<EndpointRecord>> {
        self.endpoint.as_ref()
    }

    /// Records the matched endpoint and its captured parameters.
    pub fn set_route(&mut self, endpoint: Arc<EndpointRecord>, params: PathParams) {
        self.endpoint = Some(endpoint);
        self.params = params;
    }

    /// Route template of the matched endpoint, if any.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.endpoint.as_deref().map(EndpointRecord::path)
    }

    /// Returns the captured path parameters.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Returns the validated request body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Stores the parsed request body.
    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Returns the verified token claims.
    #[must_use]
    pub fn token(&self) -> Option<&Claims> {
        self.token.as_ref()
    }

    /// Stores verified token claims.
    pub fn set_token(&mut self, claims: Claims) {
        self.token = Some(claims);
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Attaches a value for later stages and the handler, replacing any
    /// previous value of the same type.
    pub fn set_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }

    /// Gets an extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Removes an extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions.remove::<T>()
    }

    /// Moves the handler-facing parts out of the context.
    pub(crate) fn take_handler_inputs(&mut self) -> HandlerInputs {
        HandlerInputs {
            endpoint: self.endpoint.clone(),
            params: std::mem::take(&mut self.params),
            body: self.body.take(),
            token: self.token.take(),
            extensions: std::mem::take(&mut self.extensions),
        }
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
