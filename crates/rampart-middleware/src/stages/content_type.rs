//! Content-type guard.
//!
//! The only accepted request media type is `application/json`. Parameters
//! such as `charset` are ignored. A request without a `Content-Type` is
//! accepted only when it carries no body.

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderMap;
use rampart_core::spec::JSON_MEDIA_TYPE;
use rampart_core::ApiError;
use rampart_telemetry::record_rejection;

use crate::context::MiddlewareContext;
use crate::mapper::ErrorMapper;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Rejects requests that do not declare a JSON body.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeMiddleware {
    mapper: ErrorMapper,
}

impl ContentTypeMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(mapper: ErrorMapper) -> Self {
        Self { mapper }
    }
}

/// Checks the request headers, returning the rejection if any.
pub fn check_content_type(headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(value) = headers.get(CONTENT_TYPE) {
        let raw = String::from_utf8_lossy(value.as_bytes()).to_ascii_lowercase();
        let media_type = raw.split(';').next().unwrap_or_default().trim();
        if media_type == JSON_MEDIA_TYPE {
            return Ok(());
        }
        return Err(ApiError::unsupported_media_type(format!(
            "Content-type '{media_type}' not supported"
        )));
    }

    let declares_body = headers.get(CONTENT_LENGTH).is_some_and(|value| {
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(true, |length| length > 0)
    });
    if declares_body {
        return Err(ApiError::unsupported_media_type("Content-type not specified"));
    }
    Ok(())
}

impl Middleware for ContentTypeMiddleware {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Err(error) = check_content_type(request.headers()) {
                record_rejection(self.name());
                return self.mapper.map(&error);
            }
            next.run(ctx, request).await
        })
    }
}
