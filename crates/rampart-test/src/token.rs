//! Bearer tokens for tests.
//!
//! ```rust
//! use rampart_test::TestToken;
//!
//! let token = TestToken::new("secret").subject("user-1").sign().unwrap();
//! assert_eq!(token.split('.').count(), 3);
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{Map, Value};

use crate::error::TestError;

/// Builds and signs an HS256 token.
#[derive(Debug, Clone)]
#[must_use]
pub struct TestToken {
    secret: String,
    claims: Map<String, Value>,
}

impl TestToken {
    /// A token with no claims, signed with `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            claims: Map::new(),
        }
    }

    /// Sets `sub`.
    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.claim("sub", Value::String(subject.into()))
    }

    /// Sets `exp` to now plus `ttl`. A negative `ttl` gives an expired token.
    pub fn expires_in(self, ttl: Duration) -> Self {
        let exp = (Utc::now() + ttl).timestamp();
        self.claim("exp", Value::from(exp))
    }

    /// Sets `exp` one hour in the past.
    pub fn expired(self) -> Self {
        self.expires_in(Duration::hours(-1))
    }

    /// Sets an arbitrary claim.
    pub fn claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.claims.insert(name.into(), value);
        self
    }

    /// Signs the token.
    pub fn sign(&self) -> Result<String, TestError> {
        Ok(encode(
            &Header::default(),
            &self.claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?)
    }
}

/// Signs a token for `subject` that expires in an hour.
pub fn bearer_for(secret: &str, subject: &str) -> Result<String, TestError> {
    TestToken::new(secret)
        .subject(subject)
        .expires_in(Duration::hours(1))
        .sign()
}
