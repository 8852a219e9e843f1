//! Telemetry middleware.
//!
//! Opens the request span, tracks the in-flight gauge and records the
//! request counter and duration histogram once the response is ready. The
//! `route` label is the matched template, so `/person/42` and `/person/43`
//! share one series.

use rampart_telemetry::metrics::UNMATCHED_ROUTE;
use rampart_telemetry::{record_request, InFlightGuard};
use tracing::Instrument;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Emits per-request metrics and the completion log line.
#[derive(Debug, Clone, Default)]
pub struct TelemetryMiddleware;

impl TelemetryMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let _in_flight = InFlightGuard::new();
            let method = request.method().clone();
            let span = tracing::info_span!(
                "request",
                request_id = %ctx.request_id(),
                http.method = %method,
                http.path = %request.uri().path(),
            );

            let response = next.run(ctx, request).instrument(span.clone()).await;

            let status = response.status().as_u16();
            let duration = ctx.elapsed();
            let route = ctx.route().unwrap_or(UNMATCHED_ROUTE);
            record_request(route, method.as_str(), status, duration);

            span.in_scope(|| {
                tracing::info!(
                    http.route = route,
                    http.status_code = status,
                    duration_ms = duration.as_secs_f64() * 1000.0,
                    "Request completed"
                );
            });
            response
        })
    }
}
