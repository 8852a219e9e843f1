//! Route resolution.

use std::sync::Arc;

use rampart_core::ApiError;
use rampart_router::{RouteMatch, Router};
use rampart_telemetry::record_rejection;

use crate::context::MiddlewareContext;
use crate::mapper::ErrorMapper;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Message sent when no endpoint matches.
pub const NOT_FOUND_MESSAGE: &str = "Endpoint not found";

/// Resolves the endpoint for a request, or rejects it with 404.
#[derive(Debug, Clone)]
pub struct RoutingMiddleware {
    router: Arc<Router>,
    mapper: ErrorMapper,
}

impl RoutingMiddleware {
    /// Creates the middleware over a compiled router.
    #[must_use]
    pub fn new(router: Arc<Router>, mapper: ErrorMapper) -> Self {
        Self { router, mapper }
    }
}

impl Middleware for RoutingMiddleware {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.router.match_route(request.method(), request.uri().path()) {
                RouteMatch::Found { endpoint, params } => {
                    ctx.set_route(Arc::clone(endpoint), params);
                }
                RouteMatch::NotFound => {
                    record_rejection(self.name());
                    return self.mapper.map(&ApiError::not_found(NOT_FOUND_MESSAGE));
                }
            }
            next.run(ctx, request).await
        })
    }
}
