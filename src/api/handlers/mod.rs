//! Request handlers plus the shared extraction helpers they build on.

use axum::{
    Form, Json,
    body::Body,
    extract::{FromRequest, FromRequestParts, Request},
    http::{
        HeaderMap,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE, USER_AGENT},
        request::Parts,
    },
    response::Response,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::cookie::parse_cookies;
use crate::engine::{Auth, Authenticated, ClientInfo, SetCookies};
use crate::error::AuthError;

pub(crate) mod health;
pub(crate) mod oauth;
pub(crate) mod session;
pub(crate) mod sign_in;
pub(crate) mod sign_out;
pub(crate) mod sign_up;

/// Client metadata recorded on new sessions. The first `X-Forwarded-For` hop
/// wins; with no proxy in front both fields stay empty.
pub(crate) fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    ClientInfo { ip, user_agent }
}

/// Look up one cookie across however many `Cookie` headers the client sent.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| parse_cookies(header).remove(name))
}

/// Append every `Set-Cookie` header to an already-built response.
pub(crate) fn apply_cookies(mut response: Response, cookies: SetCookies) -> Response {
    for cookie in cookies.into_headers() {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// The session resolved for this request, memoized in request extensions so
/// repeated extraction costs one store lookup at most.
pub(crate) struct CurrentSession(pub Option<Authenticated>);

#[derive(Clone)]
struct ResolvedSession(Option<Authenticated>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<ResolvedSession>() {
            return Ok(Self(resolved.0.clone()));
        }
        let auth = parts
            .extensions
            .get::<Arc<Auth>>()
            .cloned()
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("auth engine extension missing")))?;
        let resolved = auth.authenticate(&parts.headers).await?;
        parts.extensions.insert(ResolvedSession(resolved.clone()));
        Ok(Self(resolved))
    }
}

/// Body extractor accepting either JSON or an HTML form, keyed off
/// `Content-Type`. Deserialization failures surface as 400.
pub(crate) struct JsonOrForm<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AuthError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|err| AuthError::BadRequest(err.to_string()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|err| AuthError::BadRequest(err.to_string()))?;
            Ok(Self(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::AuthConfig;
    use crate::store::{
        Account, Adapter, MemoryAdapter, NewUser, Session, SessionUpdate, StoreError, User,
    };
    use crate::token::TokenSigner;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn client_info_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));
        let info = client_info(&headers);
        assert_eq!(info.ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8.5"));
    }

    #[test]
    fn client_info_is_empty_without_headers() {
        let info = client_info(&HeaderMap::new());
        assert!(info.ip.is_none());
        assert!(info.user_agent.is_none());
    }

    #[test]
    fn cookie_value_spans_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(COOKIE, HeaderValue::from_static("c=3"));
        assert_eq!(cookie_value(&headers, "c").as_deref(), Some("3"));
        assert_eq!(cookie_value(&headers, "b").as_deref(), Some("2"));
        assert!(cookie_value(&headers, "d").is_none());
    }

    /// Counts session lookups while delegating to a [`MemoryAdapter`].
    struct CountingAdapter {
        inner: MemoryAdapter,
        session_lookups: AtomicUsize,
    }

    #[async_trait]
    impl Adapter for CountingAdapter {
        async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
            self.inner.get_user_by_id(id).await
        }

        async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.get_user_by_email(email).await
        }

        async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.create_user(user).await
        }

        async fn get_account(
            &self,
            provider: &str,
            provider_account_id: &str,
        ) -> Result<Option<Account>, StoreError> {
            self.inner.get_account(provider, provider_account_id).await
        }

        async fn create_account(&self, account: Account) -> Result<(), StoreError> {
            self.inner.create_account(account).await
        }

        async fn get_session_with_user(
            &self,
            session_id: &str,
        ) -> Result<Option<(Session, User)>, StoreError> {
            self.session_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.get_session_with_user(session_id).await
        }

        async fn create_session(&self, session: Session) -> Result<(), StoreError> {
            self.inner.create_session(session).await
        }

        async fn update_session(
            &self,
            session_id: &str,
            update: SessionUpdate,
        ) -> Result<(), StoreError> {
            self.inner.update_session(session_id, update).await
        }

        async fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
            self.inner.delete_session(session_id).await
        }
    }

    #[tokio::test]
    async fn current_session_resolves_once_per_request() {
        let adapter = Arc::new(CountingAdapter {
            inner: MemoryAdapter::new(),
            session_lookups: AtomicUsize::new(0),
        });
        let auth = Arc::new(Auth::new(
            adapter.clone(),
            AuthConfig::new("http://localhost:8080"),
            TokenSigner::new(SecretString::from("handlers-test-secret".to_string())),
        ));
        let signed_in = auth
            .sign_up_credentials(
                "Ada",
                "ada@example.com",
                "correct horse",
                &ClientInfo::default(),
            )
            .await
            .unwrap();

        let request = axum::http::Request::builder()
            .uri("/get-session")
            .header(
                COOKIE,
                format!("janua_session={}", signed_in.tokens.session_token),
            )
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();
        parts.extensions.insert(auth.clone());

        let first = CurrentSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        let second = CurrentSession::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert!(first.0.is_some());
        assert!(second.0.is_some());
        assert_eq!(adapter.session_lookups.load(Ordering::SeqCst), 1);
    }
}
