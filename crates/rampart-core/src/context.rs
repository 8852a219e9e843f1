//! Request context types.
//!
//! A [`RequestContext`] is created fresh for every request that reaches a
//! handler and dropped once the response is written. Handlers read the
//! request from it and write their output back into it.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::endpoint::EndpointRecord;
use crate::error::HandlerError;
use crate::params::PathParams;
use crate::token::Claims;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request sortable.
///
/// # Example
///
/// ```
/// use rampart_core::RequestId;
///
/// let id = RequestId::new();
/// let parsed: RequestId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Per-request state handed to handlers.
///
/// Handlers either fill [`data`](Self::set_data), which the pipeline wraps in
/// the success envelope, or set an explicit [`body`](Self::set_body) that is
/// sent as-is.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    endpoint: Option<Arc<EndpointRecord>>,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    params: PathParams,
    raw_body: Bytes,
    body: Option<Value>,
    token: Option<Claims>,
    extensions: Extensions,
    data: Value,
    status: Option<StatusCode>,
    explicit_body: Option<Value>,
}

impl RequestContext {
    /// Creates a context for a request.
    #[must_use]
    pub fn new(request_id: RequestId, method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id,
            endpoint: None,
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            params: PathParams::new(),
            raw_body: Bytes::new(),
            body: None,
            token: None,
            extensions: Extensions::new(),
            data: Value::Object(serde_json::Map::new()),
            status: None,
            explicit_body: None,
        }
    }

    /// Creates a `GET /` context for tests.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(RequestId::new(), Method::GET, "/")
    }

    /// Attaches the resolved endpoint.
    pub fn with_endpoint(mut self, endpoint: Arc<EndpointRecord>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the query string (without `?`).
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    /// Sets the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the captured path parameters.
    pub fn with_params(mut self, params: PathParams) -> Self {
        self.params = params;
        self
    }

    /// Sets the raw body and, if already parsed, its JSON value.
    pub fn with_body(mut self, raw: Bytes, parsed: Option<Value>) -> Self {
        self.raw_body = raw;
        self.body = parsed;
        self
    }

    /// Attaches authenticated claims.
    pub fn with_token(mut self, token: Option<Claims>) -> Self {
        self.token = token;
        self
    }

    /// Carries values that middleware stages attached to the request.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// The request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The matched endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Option<&EndpointRecord> {
        self.endpoint.as_deref()
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path, without the query.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// A captured path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// All captured path parameters.
    #[must_use]
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// The raw request body.
    #[must_use]
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// The JSON request body, if there was one.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserializes the JSON request body.
    ///
    /// A missing body or one of the wrong shape is a 400.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let parsed = match &self.body {
            Some(value) => T::deserialize(value),
            None if self.raw_body.is_empty() => {
                return Err(HandlerError::bad_request("No data received"))
            }
            None => serde_json::from_slice(&self.raw_body),
        };
        parsed.map_err(|e| HandlerError::bad_request(format!("Invalid JSON: {e}")))
    }

    /// The authenticated claims, if the endpoint required authentication.
    #[must_use]
    pub fn token(&self) -> Option<&Claims> {
        self.token.as_ref()
    }

    /// The authenticated subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.token.as_ref().map(Claims::subject)
    }

    /// A value a middleware stage attached, looked up by type.
    #[must_use]
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// All attached values.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The data accumulated so far.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Mutable access to the data payload.
    pub fn data_mut(&mut self) -> &mut Value {
        &mut self.data
    }

    /// Replaces the data payload.
    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    /// Serializes a value into the data payload.
    pub fn set_data_from<T: Serialize>(&mut self, data: &T) -> Result<(), HandlerError> {
        self.data = serde_json::to_value(data)?;
        Ok(())
    }

    /// The explicit status, if the handler set one.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Sets the status used with an explicit body.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// The explicit body, if the handler set one.
    #[must_use]
    pub fn explicit_body(&self) -> Option<&Value> {
        self.explicit_body.as_ref()
    }

    /// Sends `body` as-is instead of the success envelope.
    pub fn set_body(&mut self, body: Value) {
        self.explicit_body = Some(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_request_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<RequestId>().is_err());
    }

    #[test]
    fn test_default_data_is_empty_object() {
        let ctx = RequestContext::mock();
        assert_eq!(ctx.data(), &json!({}));
        assert!(ctx.explicit_body().is_none());
        assert!(ctx.token().is_none());
    }

    #[test]
    fn test_extensions_from_middleware() {
        #[derive(Clone, Debug, PartialEq)]
        struct Tenant(&'static str);

        let mut extensions = Extensions::new();
        extensions.insert(Tenant("acme"));
        let mut ctx = RequestContext::mock().with_extensions(extensions);
        assert_eq!(ctx.extension::<Tenant>(), Some(&Tenant("acme")));
        assert!(ctx.extension::<u32>().is_none());

        ctx.extensions_mut().insert(7_u32);
        assert_eq!(ctx.extension::<u32>(), Some(&7));
    }

    #[test]
    fn test_json_from_parsed_body() {
        #[derive(Deserialize)]
        struct Person {
            name: String,
        }

        let ctx = RequestContext::mock().with_body(Bytes::new(), Some(json!({"name": "Ada"})));
        let person: Person = ctx.json().unwrap();
        assert_eq!(person.name, "Ada");
    }

    #[test]
    fn test_json_from_raw_body() {
        let ctx = RequestContext::mock().with_body(Bytes::from_static(b"[1,2]"), None);
        let numbers: Vec<u8> = ctx.json().unwrap();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_json_missing_body() {
        let error = RequestContext::mock().json::<Value>().unwrap_err();
        assert_eq!(error.to_string(), "400:No data received");
    }

    #[test]
    fn test_headers_and_params() {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", "acme".parse().unwrap());
        let mut params = PathParams::new();
        params.push("id", "42");

        let ctx = RequestContext::mock().with_headers(headers).with_params(params);
        assert_eq!(ctx.header("x-tenant"), Some("acme"));
        assert_eq!(ctx.param("id"), Some("42"));
    }
}
