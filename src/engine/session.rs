//! Session lifecycle: validation, rolling renewal, creation, termination.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use serde_json::{Map, json};
use tracing::{debug, warn};

use crate::cookie::parse_cookies;
use crate::crypto::{constant_time_equal, generate_secure_string, hash_secret};
use crate::error::AuthError;
use crate::store::{Session, SessionUpdate, unix_now};
use crate::token::{Claims, SignOptions};

use super::{Auth, Authenticated, ClientInfo, SessionTokens};

impl Auth {
    /// Resolve the current session from request headers.
    ///
    /// Validation failures never raise: a missing, malformed, unknown,
    /// expired, or forged token degrades to `Ok(None)` because this runs on
    /// every request, public pages included. Expired and secret-mismatch
    /// sessions are deleted before returning (fail closed).
    ///
    /// # Errors
    /// Only storage failures propagate.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<Authenticated>, AuthError> {
        let Some(token) = self.bearer_token(headers) else {
            return Ok(None);
        };
        let Some((session_id, secret)) = token.split_once('.') else {
            debug!("Bearer token without id.secret shape; treating as anonymous");
            return Ok(None);
        };

        let Some((mut session, user)) = self.adapter().get_session_with_user(session_id).await?
        else {
            return Ok(None);
        };

        let now = unix_now();
        let presented = hash_secret(secret);
        let secret_ok = constant_time_equal(presented.as_bytes(), session.secret_hash.as_bytes());
        let expired = now >= session.expires_at;

        if !secret_ok || expired {
            // Single-use cleanup: a bad secret means the id leaked, an expired
            // record is dead weight either way.
            self.adapter().delete_session(session_id).await?;
            return Ok(None);
        }

        if self.config().rolling_enabled()
            && session.expires_at - now <= self.config().renew_threshold_seconds()
        {
            let extended = now + self.config().session_ttl_seconds();
            // Best-effort write-through; a lost race with a concurrent
            // extension or a transient write failure must not reject a
            // valid secret.
            match self
                .adapter()
                .update_session(
                    session_id,
                    SessionUpdate {
                        expires_at: Some(extended),
                    },
                )
                .await
            {
                Ok(()) => session.expires_at = extended,
                Err(err) => warn!("Failed to extend session expiry: {err}"),
            }
        }

        Ok(Some(Authenticated { session, user }))
    }

    /// Terminate the session referenced by the request, if any.
    ///
    /// Idempotent: an absent or malformed token is a no-op and makes no
    /// adapter calls.
    ///
    /// # Errors
    /// Only storage failures propagate.
    pub async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(token) = self.bearer_token(headers) else {
            return Ok(());
        };
        let Some((session_id, _secret)) = token.split_once('.') else {
            return Ok(());
        };
        self.adapter().delete_session(session_id).await?;
        Ok(())
    }

    /// Verify a stateless access token and return its claims. No storage
    /// lookup: signature and time claims only.
    ///
    /// # Errors
    /// Token verification failures, see [`crate::token::TokenError`].
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.signer().verify(token)?)
    }

    /// Create a session for `user_id` and mint the paired tokens.
    ///
    /// The refresh side is stateful (record with hashed secret); the access
    /// side is a signed JWT carrying the user as subject and the session id,
    /// verified without a lookup.
    pub(crate) async fn create_session_for(
        &self,
        user_id: &str,
        client: &ClientInfo,
    ) -> Result<(Session, SessionTokens), AuthError> {
        let session_id = generate_secure_string();
        let secret = generate_secure_string();
        let session = Session {
            id: session_id.clone(),
            user_id: user_id.to_string(),
            secret_hash: hash_secret(&secret),
            expires_at: unix_now() + self.config().session_ttl_seconds(),
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
        };
        self.adapter().create_session(session.clone()).await?;

        let mut payload = Map::new();
        payload.insert("sid".to_string(), json!(session_id));
        let access_token = self.signer().sign(
            payload,
            &SignOptions::new()
                .with_subject(user_id)
                .with_issuer(self.config().issuer())
                .with_expires_in(self.config().access_token_ttl_seconds()),
        )?;

        Ok((
            session,
            SessionTokens {
                session_token: format!("{session_id}.{secret}"),
                access_token,
            },
        ))
    }

    /// Bearer token from the session cookie or the `Authorization` header.
    fn bearer_token(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(header) = headers.get(COOKIE) {
            if let Ok(value) = header.to_str() {
                if let Some(token) = parse_cookies(value).remove(self.config().session_cookie()) {
                    if !token.is_empty() {
                        return Some(token);
                    }
                }
            }
        }
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let trimmed = value.trim();
        let token = trimmed
            .strip_prefix("Bearer ")
            .or_else(|| trimmed.strip_prefix("bearer "))?
            .trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}
