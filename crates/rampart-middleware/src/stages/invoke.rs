//! Handler invocation and response normalization.
//!
//! This is the terminal link of the pipeline. It builds the handler's
//! [`RequestContext`], awaits the handler inside a fault boundary that also
//! catches panics, and turns the handler's output into a response.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use http::StatusCode;
use rampart_core::{ApiError, RequestContext, SuccessEnvelope};
use serde_json::Value;

use crate::context::MiddlewareContext;
use crate::mapper::ErrorMapper;
use crate::types::{Request, Response, ResponseExt};

/// Runs the matched endpoint's handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerInvoker {
    mapper: ErrorMapper,
    validate_responses: bool,
}

impl HandlerInvoker {
    /// Creates an invoker.
    #[must_use]
    pub fn new(mapper: ErrorMapper) -> Self {
        Self {
            mapper,
            validate_responses: false,
        }
    }

    /// Checks outgoing data against the endpoint's response schema and logs
    /// mismatches. Responses are never altered.
    #[must_use]
    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// Invokes the handler for the routed request.
    pub async fn invoke(&self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        let inputs = ctx.take_handler_inputs();
        let Some(endpoint) = inputs.endpoint else {
            // Routing always runs first; reaching here means a custom
            // pipeline skipped it.
            return self.fail(ctx, ApiError::not_found("Endpoint not found"));
        };

        let (parts, raw_body) = request.into_parts();
        let mut handler_ctx = RequestContext::new(ctx.request_id(), parts.method, parts.uri.path())
            .with_endpoint(endpoint.clone())
            .with_query(parts.uri.query().map(ToString::to_string))
            .with_headers(parts.headers)
            .with_params(inputs.params)
            .with_body(raw_body, inputs.body)
            .with_token(inputs.token)
            .with_extensions(inputs.extensions);

        let handler = endpoint.handler().clone();
        let outcome = AssertUnwindSafe(handler.call(&mut handler_ctx))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(())) => self.respond(&handler_ctx),
            Ok(Err(error)) => Err(error.into_api_error()),
            Err(panic) => Err(ApiError::internal(anyhow::anyhow!(
                "handler panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        match result {
            Ok(response) => response,
            Err(error) => self.fail(ctx, error),
        }
    }

    fn respond(&self, handler_ctx: &RequestContext) -> Result<Response, ApiError> {
        let response = match handler_ctx.explicit_body() {
            Some(body) => {
                if self.validate_responses {
                    check_response(handler_ctx, body);
                }
                Response::json(handler_ctx.status().unwrap_or(StatusCode::OK), body)
            }
            None => {
                if self.validate_responses {
                    check_response(handler_ctx, handler_ctx.data());
                }
                Response::json(StatusCode::OK, &SuccessEnvelope::new(handler_ctx.data().clone()))
            }
        };
        response.map_err(ApiError::internal)
    }

    fn fail(&self, ctx: &MiddlewareContext, error: ApiError) -> Response {
        if let Some(fault) = error.fault() {
            tracing::error!(
                request_id = %ctx.request_id(),
                http.route = ctx.route().unwrap_or_default(),
                error = %fault,
                "Handler fault"
            );
        }
        self.mapper.map(&error)
    }
}

fn check_response(handler_ctx: &RequestContext, payload: &Value) {
    let Some(schema) = handler_ctx.endpoint().and_then(|e| e.response_schema()) else {
        return;
    };
    let result = schema.validate(payload);
    if !result.is_valid() {
        tracing::warn!(
            request_id = %handler_ctx.request_id(),
            errors = %result.message(),
            "Response does not match its schema"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
