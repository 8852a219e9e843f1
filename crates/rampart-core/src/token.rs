//! Decoded bearer token claims.
//!
//! Signature checking happens in the authentication stage. This module only
//! interprets the payload: `sub` is required, and `exp` may be either epoch
//! seconds or an RFC 3339 timestamp string.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// Reasons a token payload is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimsError {
    /// The payload is not a JSON object.
    #[error("token payload is not an object")]
    NotAnObject,
    /// `sub` is absent, empty, or not a string or number.
    #[error("token has no subject")]
    MissingSubject,
    /// `exp` is neither epoch seconds nor an RFC 3339 timestamp.
    #[error("token expiration is malformed")]
    InvalidExpiration,
}

/// Claims of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    subject: String,
    expires_at: Option<DateTime<Utc>>,
    raw: Map<String, Value>,
}

impl Claims {
    /// Interprets a decoded token payload.
    pub fn from_payload(payload: Value) -> Result<Self, ClaimsError> {
        let Value::Object(raw) = payload else {
            return Err(ClaimsError::NotAnObject);
        };

        let subject = match raw.get("sub") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(ClaimsError::MissingSubject),
        };

        let expires_at = match raw.get("exp") {
            None | Some(Value::Null) => None,
            Some(exp) => Some(parse_expiration(exp).ok_or(ClaimsError::InvalidExpiration)?),
        };

        Ok(Self {
            subject,
            expires_at,
            raw,
        })
    }

    /// The `sub` claim.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The `exp` claim, if present.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token expired strictly before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    /// Returns any claim by name.
    #[must_use]
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.raw.get(claim)
    }

    /// Returns the full payload.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }
}

fn parse_expiration(exp: &Value) -> Option<DateTime<Utc>> {
    match exp {
        Value::Number(n) => {
            let seconds = n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64))?;
            Utc.timestamp_opt(seconds, 0).single()
        }
        Value::String(s) => {
            if let Ok(seconds) = s.trim().parse::<i64>() {
                return Utc.timestamp_opt(seconds, 0).single();
            }
            DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
        _ => None,
    }
}
