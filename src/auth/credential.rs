//! Bearer credential
//!
//! Wraps the opaque token returned by login/registration and reads its expiry
//! claim. The signature is never checked on the client; the server is the
//! authority. A token whose claims cannot be read counts as expired.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Claims the client cares about. Everything else in the payload is ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Token expiration timestamp (seconds since epoch)
    pub exp: i64,
    /// User identifier as issued by the API
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
}

static UNVERIFIED: Lazy<Validation> = Lazy::new(|| {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
});

/// Opaque bearer token with an embedded expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Decode the payload claims without verifying the signature.
    pub fn claims(&self) -> Option<Claims> {
        decode::<Claims>(&self.0, &DecodingKey::from_secret(&[]), &UNVERIFIED)
            .map(|data| data.claims)
            .ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims()
            .and_then(|c| Utc.timestamp_opt(c.exp, 0).single())
    }

    /// Expired at `now`, or unreadable.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(exp) => exp < now,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// User id carried by the token, if any.
    pub fn subject(&self) -> Option<String> {
        self.claims().and_then(|c| c.user_id.or(c.sub))
    }
}

// Tokens must not end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
