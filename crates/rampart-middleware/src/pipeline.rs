//! Pipeline assembly and execution.
//!
//! [`Pipeline::standard`] builds the fixed stage order every Rampart
//! service uses:
//!
//! ```text
//! Request → RequestId → Telemetry → Routing → ContentType → Validation → Authentication → Handler
//! ```
//!
//! Each stage may short-circuit with an error envelope. The handler
//! invocation is the terminal link and is not a [`Middleware`].

use std::sync::Arc;

use rampart_router::Router;

use crate::context::MiddlewareContext;
use crate::mapper::ErrorMapper;
use crate::middleware::{Middleware, Next};
use crate::stages::{
    AuthenticationMiddleware, ContentTypeMiddleware, HandlerInvoker, JwtVerifier,
    RequestIdMiddleware, RoutingMiddleware, TelemetryMiddleware, ValidationMiddleware,
};
use crate::types::{Request, Response};

/// A stage of the standard pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Assign or propagate the request ID.
    RequestId,
    /// Request span, metrics and completion log.
    Telemetry,
    /// Endpoint lookup.
    Routing,
    /// Media type check.
    ContentType,
    /// Request body schema validation.
    Validation,
    /// Bearer token verification.
    Authentication,
    /// Handler invocation and response normalization.
    Handler,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::Telemetry => "telemetry",
            Self::Routing => "routing",
            Self::ContentType => "content_type",
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Handler => "handler",
        }
    }

    /// All stages in execution order.
    #[must_use]
    pub const fn all() -> [Stage; 7] {
        [
            Self::RequestId,
            Self::Telemetry,
            Self::Routing,
            Self::ContentType,
            Self::Validation,
            Self::Authentication,
            Self::Handler,
        ]
    }
}

/// Settings for [`Pipeline::standard`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Expose internal fault text in error envelopes.
    pub debug: bool,
    /// Check handler output against response schemas.
    pub validate_responses: bool,
    /// Shared secret for HMAC-signed tokens.
    pub jwt_secret: Option<String>,
    /// Endpoint trait labels that require authentication.
    pub auth_traits: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            debug: false,
            validate_responses: false,
            jwt_secret: None,
            auth_traits: vec!["authenticated".to_string()],
        }
    }
}

/// An assembled middleware chain in front of the handler invoker.
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
    invoker: Arc<HandlerInvoker>,
}

impl Pipeline {
    /// Creates a builder for a custom pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Builds the standard pipeline over a compiled router.
    #[must_use]
    pub fn standard(router: Arc<Router>, options: PipelineOptions) -> Self {
        let mapper = if options.debug {
            ErrorMapper::exposing_internal_errors()
        } else {
            ErrorMapper::new()
        };
        let verifier = options.jwt_secret.as_deref().map(JwtVerifier::new);

        Self::builder()
            .stage(RequestIdMiddleware::new())
            .stage(TelemetryMiddleware::new())
            .stage(RoutingMiddleware::new(router, mapper))
            .stage(ContentTypeMiddleware::new(mapper))
            .stage(ValidationMiddleware::new(mapper))
            .stage(AuthenticationMiddleware::new(verifier, options.auth_traits, mapper))
            .invoker(HandlerInvoker::new(mapper).validate_responses(options.validate_responses))
            .build()
    }

    /// Processes a request with a fresh context.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = MiddlewareContext::new();
        self.process(&mut ctx, request).await
    }

    /// Processes a request through every stage and the handler.
    pub async fn process(&self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        self.build_chain().run(ctx, request).await
    }

    fn build_chain(&self) -> Next<'_> {
        let invoker = Arc::clone(&self.invoker);
        let mut next = Next::handler(move |ctx, request| {
            Box::pin(async move { invoker.invoke(ctx, request).await })
        });

        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn Middleware>>,
    invoker: HandlerInvoker,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Sets the terminal handler invoker.
    #[must_use]
    pub fn invoker(mut self, invoker: HandlerInvoker) -> Self {
        self.invoker = invoker;
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            invoker: Arc::new(self.invoker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, FnMiddleware};
    use bytes::Bytes;
    use http::{HeaderValue, StatusCode};
    use std::sync::Mutex;

    struct OrderTrackingMiddleware {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTrackingMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.name);
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_executes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .stage(OrderTrackingMiddleware { name: "first", order: Arc::clone(&order) })
            .stage(OrderTrackingMiddleware { name: "second", order: Arc::clone(&order) })
            .stage(OrderTrackingMiddleware { name: "third", order: Arc::clone(&order) })
            .build();

        let response = pipeline.handle(request()).await;

        // No routing stage, so the invoker has no endpoint.
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(pipeline.stage_names(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_later_stages() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::builder()
            .stage(FnMiddleware::new("gate", |_ctx, _req, _next| {
                Box::pin(async {
                    let mut response = http::Response::new(http_body_util::Full::new(Bytes::new()));
                    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
                    response
                        .headers_mut()
                        .insert("x-gate", HeaderValue::from_static("closed"));
                    response
                })
            }))
            .stage(OrderTrackingMiddleware { name: "after", order: Arc::clone(&order) })
            .build();

        let response = pipeline.handle(request()).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(order.lock().unwrap().is_empty());
    }

    #[test]
    fn test_standard_stage_order() {
        let pipeline = Pipeline::standard(Arc::new(Router::default()), PipelineOptions::default());
        let expected: Vec<_> = Stage::all()
            .iter()
            .filter(|stage| **stage != Stage::Handler)
            .map(|stage| stage.name())
            .collect();
        assert_eq!(pipeline.stage_names(), expected);
        assert_eq!(pipeline.stage_count(), 6);
    }

    #[test]
    fn test_default_options() {
        let options = PipelineOptions::default();
        assert!(!options.debug);
        assert_eq!(options.auth_traits, vec!["authenticated".to_string()]);
    }
}
