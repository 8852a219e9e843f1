//! Request body validation.
//!
//! Endpoints that declare a request schema require a JSON body that
//! satisfies it. For other endpoints a well-formed JSON body is still parsed
//! for the handler, but nothing is enforced.

use bytes::Bytes;
use rampart_core::{ApiError, EndpointRecord};
use rampart_telemetry::record_rejection;
use serde_json::Value;

use crate::context::MiddlewareContext;
use crate::mapper::ErrorMapper;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Message sent when a schema-bound endpoint receives an empty body.
pub const NO_DATA_MESSAGE: &str = "No data received";

/// Validates request bodies against the endpoint's schema.
#[derive(Debug, Clone, Default)]
pub struct ValidationMiddleware {
    mapper: ErrorMapper,
}

impl ValidationMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(mapper: ErrorMapper) -> Self {
        Self { mapper }
    }
}

/// Parses and validates `body` for `endpoint`.
///
/// Returns the parsed body, `None` for an empty or non-JSON body on an
/// endpoint without a schema, or the 400 rejection.
pub fn validate_body(endpoint: &EndpointRecord, body: &Bytes) -> Result<Option<Value>, ApiError> {
    let Some(schema) = endpoint.request_schema() else {
        return Ok(serde_json::from_slice(body).ok());
    };

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request(NO_DATA_MESSAGE));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))?;

    let result = schema.validate(&value);
    if !result.is_valid() {
        return Err(ApiError::bad_request(result.message()));
    }
    Ok(Some(value))
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(endpoint) = ctx.endpoint() {
                match validate_body(endpoint, request.body()) {
                    Ok(Some(body)) => ctx.set_body(body),
                    Ok(None) => {}
                    Err(error) => {
                        record_rejection(self.name());
                        return self.mapper.map(&error);
                    }
                }
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{handler_fn, ApiSpec, HandlerSet, Operation, RequestContext, ResourceNode};
    use rampart_router::{compile, ControllerRegistry};
    use serde_json::json;

    fn endpoint(schema: Option<Value>) -> EndpointRecord {
        let mut operation = Operation::new("post");
        if let Some(schema) = schema {
            operation = operation.with_request_schema(schema);
        }
        let spec = ApiSpec::new().with_resource(ResourceNode::new("/person").with_operation(operation));
        let registry = ControllerRegistry::new().controller(
            "/person",
            HandlerSet::new().post(handler_fn(|_ctx: &mut RequestContext| Box::pin(async { Ok(()) }))),
        );
        compile(&spec, "", &registry).unwrap().remove(0)
    }

    fn person_schema() -> Value {
        json!({
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"}
            }
        })
    }

    fn message(result: Result<Option<Value>, ApiError>) -> String {
        result.unwrap_err().message().to_string()
    }

    #[test]
    fn test_valid_body_is_parsed() {
        let body = Bytes::from_static(br#"{"name":"Ada","age":36}"#);
        let parsed = validate_body(&endpoint(Some(person_schema())), &body).unwrap();
        assert_eq!(parsed, Some(json!({"name": "Ada", "age": 36})));
    }

    #[test]
    fn test_empty_body_rejected() {
        let endpoint = endpoint(Some(person_schema()));
        assert_eq!(message(validate_body(&endpoint, &Bytes::new())), NO_DATA_MESSAGE);
        assert_eq!(message(validate_body(&endpoint, &Bytes::from_static(b"  \n"))), NO_DATA_MESSAGE);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let error = validate_body(&endpoint(Some(person_schema())), &Bytes::from_static(b"{name"))
            .unwrap_err();
        assert_eq!(error.status_code(), http::StatusCode::BAD_REQUEST);
        assert!(error.message().starts_with("Invalid JSON: "));
    }

    #[test]
    fn test_schema_errors_are_joined() {
        let body = Bytes::from_static(br#"{"age":"old"}"#);
        assert_eq!(
            message(validate_body(&endpoint(Some(person_schema())), &body)),
            "instance requires property \"name\", instance.age is not of a type(s) integer"
        );
    }

    #[test]
    fn test_schemaless_endpoint_is_lenient() {
        let endpoint = endpoint(None);
        assert_eq!(validate_body(&endpoint, &Bytes::new()).unwrap(), None);
        assert_eq!(validate_body(&endpoint, &Bytes::from_static(b"nope")).unwrap(), None);
        assert_eq!(
            validate_body(&endpoint, &Bytes::from_static(b"[1]")).unwrap(),
            Some(json!([1]))
        );
    }
}
