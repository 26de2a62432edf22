//! Compact signed token (JWT, HS256) codec for stateless access tokens.
//!
//! Signature and structural checks are delegated to `jsonwebtoken`; the time
//! claims (`exp`, `nbf`) are checked here with no leeway so the boundary
//! semantics are exact: a token is dead the second `exp` is reached and inert
//! until `nbf` has passed.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Verification and creation failures, distinguished internally.
///
/// All verification kinds collapse to a generic 401 at the HTTP surface.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Wrong segment count, bad base64, or undecodable claims.
    #[error("malformed token")]
    Malformed,
    /// Signature does not match the signing secret.
    #[error("invalid token signature")]
    InvalidSignature,
    /// Current time is at or past `exp`.
    #[error("token expired")]
    Expired,
    /// Current time is before `nbf`.
    #[error("token not yet valid")]
    NotYetValid,
    /// Token could not be created (serialization failure).
    #[error("failed to sign token")]
    Creation(#[source] jsonwebtoken::errors::Error),
}

/// Standard claims merged with the caller payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, unix seconds.
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Caller payload, flattened alongside the registered claims.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Options applied when signing a token.
#[derive(Debug, Clone, Default)]
pub struct SignOptions {
    expires_in: Option<i64>,
    not_before: Option<i64>,
    issuer: Option<String>,
    audiences: Vec<String>,
    subject: Option<String>,
    key_id: Option<String>,
}

impl SignOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds until expiry. Required for any token expected to expire.
    #[must_use]
    pub fn with_expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    /// Seconds until the token becomes valid.
    #[must_use]
    pub fn with_not_before(mut self, seconds: i64) -> Self {
        self.not_before = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    #[must_use]
    pub fn with_audiences(mut self, audiences: Vec<String>) -> Self {
        self.audiences = audiences;
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Custom `kid` header for key rotation schemes.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }
}

/// Symmetric signer/verifier bound to one secret at construction.
pub struct TokenSigner {
    secret: SecretString,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Sign a payload into a compact token.
    ///
    /// # Errors
    /// Returns [`TokenError::Creation`] if claim serialization fails.
    pub fn sign(&self, payload: Map<String, Value>, options: &SignOptions) -> Result<String, TokenError> {
        let now = unix_now();
        let claims = Claims {
            iat: now,
            exp: options.expires_in.map(|seconds| now + seconds),
            nbf: options.not_before.map(|seconds| now + seconds),
            iss: options.issuer.clone(),
            aud: if options.audiences.is_empty() {
                None
            } else {
                Some(options.audiences.clone())
            },
            sub: options.subject.clone(),
            extra: payload,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = options.key_id.clone();

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        jsonwebtoken::encode(&header, &claims, &key).map_err(TokenError::Creation)
    }

    /// Verify a compact token and return its claims.
    ///
    /// # Errors
    /// [`TokenError::Malformed`] for structural problems,
    /// [`TokenError::InvalidSignature`] for a signature mismatch,
    /// [`TokenError::Expired`] once `exp` is reached,
    /// [`TokenError::NotYetValid`] before `nbf`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        // Time claims are checked below; the library only proves the signature
        // and decodes the claims here.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let decoded = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        let now = unix_now();
        if let Some(exp) = decoded.claims.exp {
            if now >= exp {
                return Err(TokenError::Expired);
            }
        }
        if let Some(nbf) = decoded.claims.nbf {
            if now < nbf {
                return Err(TokenError::NotYetValid);
            }
        }

        Ok(decoded.claims)
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
