//! Test response wrapper.

use std::fmt;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A fully buffered response with assertion helpers.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers an HTTP response.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The status code as a number.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// A header value as text.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// The Content-Type header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// The body as a JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// The `data` member of a success or error envelope.
    pub fn data(&self) -> Result<Value, TestError> {
        Ok(self.json_value()?.get("data").cloned().unwrap_or(Value::Null))
    }

    /// The `message` member of a success or error envelope.
    pub fn message(&self) -> Result<String, TestError> {
        let body = self.json_value()?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status differs.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "Expected status {expected}, got {} with body {:?}",
            self.status,
            self.body
        );
        self
    }

    /// Asserts a `{statusCode: 200, message: "", data}` envelope and returns `data`.
    ///
    /// # Panics
    ///
    /// Panics if the response is not a success envelope.
    pub fn assert_success_envelope(&self) -> Value {
        self.assert_status(200);
        let body = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body is not JSON: {e}"));
        assert_eq!(body["statusCode"], 200, "Unexpected envelope: {body}");
        assert_eq!(body["message"], "", "Unexpected envelope: {body}");
        body.get("data").cloned().unwrap_or(Value::Null)
    }

    /// Asserts an exact `{status, message, data: {}}` error envelope.
    ///
    /// # Panics
    ///
    /// Panics if the status or envelope differ.
    pub fn assert_error(&self, status: u16, message: &str) -> &Self {
        self.assert_status(status);
        let body = self
            .json_value()
            .unwrap_or_else(|e| panic!("Body is not JSON: {e}"));
        assert_eq!(
            body,
            serde_json::json!({ "status": status, "message": message, "data": {} })
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("Header '{name}' not found"));
        assert_eq!(actual, expected.as_ref(), "Header '{name}' mismatch");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: StatusCode, body: &Value) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(status, headers, Bytes::from(body.to_string()))
    }

    #[test]
    fn test_success_envelope() {
        let resp = response(
            StatusCode::OK,
            &json!({"statusCode": 200, "message": "", "data": {"id": 1}}),
        );
        assert_eq!(resp.assert_success_envelope(), json!({"id": 1}));
        assert_eq!(resp.data().unwrap(), json!({"id": 1}));
        assert_eq!(resp.content_type(), Some("application/json"));
    }

    #[test]
    fn test_error_envelope() {
        let resp = response(
            StatusCode::FORBIDDEN,
            &json!({"status": 403, "message": "forbidden resource", "data": {}}),
        );
        resp.assert_error(403, "forbidden resource");
        assert_eq!(resp.message().unwrap(), "forbidden resource");
        assert!(!resp.is_success());
    }

    #[test]
    #[should_panic(expected = "Expected status 200")]
    fn test_assert_status_mismatch() {
        let resp = response(StatusCode::NOT_FOUND, &json!({}));
        resp.assert_status(200);
    }

    #[test]
    fn test_text_and_invalid_json() {
        let resp = TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from("plain"));
        assert_eq!(resp.text().unwrap(), "plain");
        assert!(matches!(resp.json_value(), Err(TestError::Json(_))));
    }
}
