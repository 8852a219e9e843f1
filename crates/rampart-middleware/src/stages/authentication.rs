//! Trait-based JWT authentication.
//!
//! An endpoint requires a bearer token when any of its trait labels is one
//! of the configured authentication traits. Tokens are HMAC-signed JWTs.
//! Only the signature is checked by `jsonwebtoken`; the subject and expiry
//! rules are applied afterwards so each failure gets its own message.

use chrono::Utc;
use http::header::AUTHORIZATION;
use indexmap::IndexSet;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rampart_core::{ApiError, Claims, ClaimsError, EndpointRecord};
use rampart_telemetry::record_rejection;
use serde_json::Value;

use crate::context::MiddlewareContext;
use crate::mapper::ErrorMapper;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Message for a missing `Authorization` header.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
/// Message for a token that cannot be decoded or verified.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid JWT";
/// Message for a token without a subject.
pub const MISSING_SUBJECT_MESSAGE: &str = "Invalid JWT - Missing Subject";
/// Message for an expired token.
pub const EXPIRED_MESSAGE: &str = "Invalid JWT - Expired";

const BEARER_PREFIX: &str = "bearer ";

/// Verifies HMAC-signed tokens against a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Creates a verifier for HS256, HS384 and HS512 tokens.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifies an `Authorization` header value and returns the claims.
    pub fn verify_header(&self, header: &str) -> Result<Claims, ApiError> {
        let token = strip_bearer(header).ok_or_else(|| ApiError::invalid_token(INVALID_TOKEN_MESSAGE))?;
        self.verify(token)
    }

    /// Verifies a raw token and returns the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let payload = decode::<Value>(token, &self.key, &self.validation)
            .map_err(|_| ApiError::invalid_token(INVALID_TOKEN_MESSAGE))?
            .claims;

        let claims = Claims::from_payload(payload).map_err(|error| match error {
            ClaimsError::MissingSubject => ApiError::invalid_token(MISSING_SUBJECT_MESSAGE),
            ClaimsError::NotAnObject | ClaimsError::InvalidExpiration => {
                ApiError::invalid_token(INVALID_TOKEN_MESSAGE)
            }
        })?;

        if claims.is_expired_at(Utc::now()) {
            return Err(ApiError::unauthorized(EXPIRED_MESSAGE));
        }
        Ok(claims)
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

fn strip_bearer(header: &str) -> Option<&str> {
    let prefix = header.get(..BEARER_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(BEARER_PREFIX)
        .then(|| header[BEARER_PREFIX.len()..].trim())
}

/// Rejects unauthenticated requests to protected endpoints.
#[derive(Debug, Clone)]
pub struct AuthenticationMiddleware {
    verifier: Option<JwtVerifier>,
    traits: IndexSet<String>,
    mapper: ErrorMapper,
}

impl AuthenticationMiddleware {
    /// Creates the middleware.
    ///
    /// Without a verifier every protected endpoint fails with an internal
    /// error, so callers should refuse to start in that state.
    #[must_use]
    pub fn new(
        verifier: Option<JwtVerifier>,
        traits: impl IntoIterator<Item = String>,
        mapper: ErrorMapper,
    ) -> Self {
        Self {
            verifier,
            traits: traits.into_iter().collect(),
            mapper,
        }
    }

    /// Whether `endpoint` requires a token.
    #[must_use]
    pub fn requires_auth(&self, endpoint: &EndpointRecord) -> bool {
        endpoint.traits().iter().any(|label| self.traits.contains(label))
    }

    fn authenticate(&self, request: &Request) -> Result<Claims, ApiError> {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::unauthorized(UNAUTHORIZED_MESSAGE))?;
        let header = header
            .to_str()
            .map_err(|_| ApiError::invalid_token(INVALID_TOKEN_MESSAGE))?;

        let Some(verifier) = &self.verifier else {
            tracing::error!("Endpoint requires authentication but no JWT secret is configured");
            return Err(ApiError::internal(anyhow::anyhow!("no JWT secret configured")));
        };
        verifier.verify_header(header)
    }
}

impl Middleware for AuthenticationMiddleware {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let required = ctx.endpoint().is_some_and(|e| self.requires_auth(e));
            if required {
                match self.authenticate(&request) {
                    Ok(claims) => ctx.set_token(claims),
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
    use bytes::Bytes;
    use http::StatusCode;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn mint(claims: &Value, algorithm: Algorithm, secret: &str) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(SECRET)
    }

    fn failure(header: &str) -> (StatusCode, String) {
        let error = verifier().verify_header(header).unwrap_err();
        (error.status_code(), error.message().to_string())
    }

    #[test]
    fn test_valid_token() {
        let token = mint(&json!({"sub": "user-1"}), Algorithm::HS256, SECRET);
        let claims = verifier().verify_header(&format!("Bearer {token}")).unwrap();
        assert_eq!(claims.subject(), "user-1");
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let token = mint(&json!({"sub": "user-1"}), Algorithm::HS512, SECRET);
        assert!(verifier().verify_header(&format!("bEaReR {token}")).is_ok());
    }

    #[test]
    fn test_missing_prefix() {
        let token = mint(&json!({"sub": "user-1"}), Algorithm::HS256, SECRET);
        assert_eq!(failure(&token), (StatusCode::BAD_REQUEST, INVALID_TOKEN_MESSAGE.into()));
    }

    #[test]
    fn test_wrong_secret() {
        let token = mint(&json!({"sub": "user-1"}), Algorithm::HS256, "other");
        assert_eq!(
            failure(&format!("Bearer {token}")),
            (StatusCode::BAD_REQUEST, INVALID_TOKEN_MESSAGE.into())
        );
    }

    #[test]
    fn test_garbage_token() {
        assert_eq!(
            failure("Bearer not.a.jwt"),
            (StatusCode::BAD_REQUEST, INVALID_TOKEN_MESSAGE.into())
        );
    }

    #[test]
    fn test_missing_subject() {
        let token = mint(&json!({"name": "anon"}), Algorithm::HS256, SECRET);
        assert_eq!(
            failure(&format!("Bearer {token}")),
            (StatusCode::BAD_REQUEST, MISSING_SUBJECT_MESSAGE.into())
        );
    }

    #[test]
    fn test_expired_numeric() {
        let exp = Utc::now().timestamp() - 60;
        let token = mint(&json!({"sub": "user-1", "exp": exp}), Algorithm::HS256, SECRET);
        assert_eq!(
            failure(&format!("Bearer {token}")),
            (StatusCode::UNAUTHORIZED, EXPIRED_MESSAGE.into())
        );
    }

    #[test]
    fn test_expiry_as_timestamp_string() {
        let future = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        let token = mint(&json!({"sub": "user-1", "exp": future}), Algorithm::HS256, SECRET);
        assert!(verifier().verify_header(&format!("Bearer {token}")).is_ok());

        let past = "2001-01-01T00:00:00Z";
        let token = mint(&json!({"sub": "user-1", "exp": past}), Algorithm::HS256, SECRET);
        assert_eq!(
            failure(&format!("Bearer {token}")),
            (StatusCode::UNAUTHORIZED, EXPIRED_MESSAGE.into())
        );
    }

    #[test]
    fn test_unparsable_expiry() {
        let token = mint(&json!({"sub": "user-1", "exp": "soon"}), Algorithm::HS256, SECRET);
        assert_eq!(
            failure(&format!("Bearer {token}")),
            (StatusCode::BAD_REQUEST, INVALID_TOKEN_MESSAGE.into())
        );
    }

    #[tokio::test]
    async fn test_missing_header_on_protected_endpoint() {
        use rampart_core::{handler_fn, ApiSpec, HandlerSet, Operation, RequestContext, ResourceNode};
        use rampart_router::{compile, ControllerRegistry};
        use std::sync::Arc;

        let spec = ApiSpec::new().with_resource(
            ResourceNode::new("/me").with_operation(Operation::new("get").with_trait("authenticated")),
        );
        let registry = ControllerRegistry::new().controller(
            "/me",
            HandlerSet::new().get(handler_fn(|_ctx: &mut RequestContext| Box::pin(async { Ok(()) }))),
        );
        let endpoint = Arc::new(compile(&spec, "", &registry).unwrap().remove(0));

        let middleware = AuthenticationMiddleware::new(
            Some(verifier()),
            vec!["authenticated".to_string()],
            ErrorMapper::new(),
        );
        assert!(middleware.requires_auth(&endpoint));

        let mut ctx = MiddlewareContext::new();
        ctx.set_route(endpoint, rampart_core::PathParams::new());
        let request = http::Request::builder().uri("/me").body(Bytes::new()).unwrap();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { http::Response::new(http_body_util::Full::new(Bytes::new())) })
        });

        let response = middleware.process(&mut ctx, request, next).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(ctx.token().is_none());
    }
}
