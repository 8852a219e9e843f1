//! Request and response types used by the pipeline.
//!
//! The server buffers the whole request body (bounded by the configured
//! limit) before the pipeline runs, so requests carry plain [`Bytes`].

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

/// The HTTP request type used in the middleware pipeline.
pub type Request = http::Request<Bytes>;

/// The HTTP response type used in the middleware pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// Content type of every response the pipeline produces.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Extension trait for building JSON responses.
pub trait ResponseExt {
    /// Creates a response with a pre-serialized JSON body.
    fn json_bytes(status: StatusCode, body: Vec<u8>) -> Response;

    /// Serializes `body` into a JSON response.
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Response, serde_json::Error>;
}

impl ResponseExt for Response {
    fn json_bytes(status: StatusCode, body: Vec<u8>) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        response
    }

    fn json<T: Serialize>(status: StatusCode, body: &T) -> Result<Response, serde_json::Error> {
        serde_json::to_vec(body).map(|bytes| Self::json_bytes(status, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_json_response() {
        let response = Response::json(StatusCode::CREATED, &json!({"id": 1})).unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"id":1}"#);
    }
}
