//! End-to-end flows through the HTTP surface over the in-memory adapter.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tower::ServiceExt;

use janua::api;
use janua::engine::{Auth, ClientInfo, config::AuthConfig};
use janua::provider::{OAuthProvider, ProviderExchangeError, UserData};
use janua::store::{
    Account, Adapter, MemoryAdapter, NewUser, Session, SessionUpdate, StoreError, User,
};
use janua::token::TokenSigner;

const BASE: &str = "/api/auth";

fn engine_with(adapter: Arc<dyn Adapter>) -> Auth {
    Auth::new(
        adapter,
        AuthConfig::new("http://localhost:8080"),
        TokenSigner::new(SecretString::from("integration-test-secret".to_string())),
    )
}

fn app(auth: Auth) -> Router {
    api::router(Arc::new(auth))
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// All `name=value` pairs from the response's `Set-Cookie` headers, joined
/// into one request `Cookie` header.
fn cookie_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("{BASE}{path}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(path: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(format!("{BASE}{path}"));
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn sign_up_then_session_then_sign_out() {
    let app = app(engine_with(Arc::new(MemoryAdapter::new())));

    let response = app
        .clone()
        .oneshot(post_json(
            "/sign-up",
            json!({"name": "Ada", "email": "ada@example.com", "password": "correct horse"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = cookie_header(&response);
    assert!(cookies.contains("janua_session="));
    assert!(cookies.contains("janua_access="));
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["session_token"].as_str().unwrap().contains('.'));

    // Cookie authenticates the session lookup.
    let response = app
        .clone()
        .oneshot(get("/get-session", Some(&cookies)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["session"]["id"].is_string());
    assert!(body["session"].get("secret_hash").is_none());

    // Sign out, then the same cookie is dead.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/sign-out"))
                .header(header::COOKIE, &cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(cookie_header(&response).contains("janua_session="));

    let response = app
        .oneshot(get("/get-session", Some(&cookies)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body, json!({"session": null, "user": null}));
}

#[tokio::test]
async fn sign_in_rejects_bad_credentials_with_stable_message() {
    let app = app(engine_with(Arc::new(MemoryAdapter::new())));

    let response = app
        .clone()
        .oneshot(post_json(
            "/sign-in",
            json!({"email": "ghost@example.com", "password": "whatever!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body, json!({"error": "invalid credentials"}));
}

#[tokio::test]
async fn sign_in_accepts_form_bodies() {
    let app = app(engine_with(Arc::new(MemoryAdapter::new())));

    let response = app
        .clone()
        .oneshot(post_json(
            "/sign-up",
            json!({"name": "Ada", "email": "ada@example.com", "password": "correct horse"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/sign-in"))
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from(
                    "email=ada%40example.com&password=correct%20horse",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_session_is_null_not_an_error() {
    let app = app(engine_with(Arc::new(MemoryAdapter::new())));

    let response = app.oneshot(get("/get-session", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"session": null, "user": null}));
}

/// Provider double that counts token exchanges.
struct FakeProvider {
    exchanges: AtomicUsize,
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn id(&self) -> &'static str {
        "acme"
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        format!("https://acme.example/authorize?state={state}&code_challenge={code_challenge}")
    }

    async fn fetch_user_data(
        &self,
        _code: &str,
        _code_verifier: &str,
    ) -> Result<UserData, ProviderExchangeError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        Ok(UserData {
            id: "acme-7".to_string(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            image: None,
        })
    }
}

#[tokio::test]
async fn oauth_flow_signs_in_through_the_router() {
    let provider = Arc::new(FakeProvider {
        exchanges: AtomicUsize::new(0),
    });
    let auth = engine_with(Arc::new(MemoryAdapter::new())).with_provider(provider.clone());
    let app = app(auth);

    let response = app.clone().oneshot(get("/acme", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://acme.example/authorize?"));
    let transient = cookie_header(&response);
    assert!(transient.contains("janua_state="));
    assert!(transient.contains("janua_verifier="));

    // Replay the state the server stashed in the cookie.
    let state = transient
        .split("; ")
        .find_map(|pair| pair.strip_prefix("janua_state="))
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(get(
            &format!("/acme/callback?state={state}&code=authcode"),
            Some(&transient),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
    let session_cookies = cookie_header(&response);
    assert!(session_cookies.contains("janua_session="));

    let response = app
        .oneshot(get("/get-session", Some(&session_cookies)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "grace@example.com");
}

#[tokio::test]
async fn oauth_callback_accepts_a_form_post() {
    let provider = Arc::new(FakeProvider {
        exchanges: AtomicUsize::new(0),
    });
    let auth = engine_with(Arc::new(MemoryAdapter::new())).with_provider(provider.clone());
    let app = app(auth);

    let response = app.clone().oneshot(get("/acme", None)).await.unwrap();
    let transient = cookie_header(&response);
    let state = transient
        .split("; ")
        .find_map(|pair| pair.strip_prefix("janua_state="))
        .unwrap()
        .to_string();

    // response_mode=form_post providers deliver state and code in the body.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("{BASE}/acme/callback"))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(header::COOKIE, &transient)
                .body(Body::from(format!("state={state}&code=authcode")))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 1);
    assert!(cookie_header(&response).contains("janua_session="));
}

#[tokio::test]
async fn oauth_state_mismatch_is_401_with_no_exchange() {
    let provider = Arc::new(FakeProvider {
        exchanges: AtomicUsize::new(0),
    });
    let auth = engine_with(Arc::new(MemoryAdapter::new())).with_provider(provider.clone());
    let app = app(auth);

    let response = app.clone().oneshot(get("/acme", None)).await.unwrap();
    let transient = cookie_header(&response);

    let response = app
        .oneshot(get(
            "/acme/callback?state=forged&code=authcode",
            Some(&transient),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(provider.exchanges.load(Ordering::SeqCst), 0);
}

/// Counts every adapter call while delegating to a [`MemoryAdapter`].
struct CountingAdapter {
    inner: MemoryAdapter,
    calls: AtomicUsize,
}

impl CountingAdapter {
    fn new() -> Self {
        Self {
            inner: MemoryAdapter::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Adapter for CountingAdapter {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user_by_email(email).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_user(user).await
    }

    async fn get_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_account(provider, provider_account_id).await
    }

    async fn create_account(&self, account: Account) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_account(account).await
    }

    async fn get_session_with_user(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, User)>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_session_with_user(session_id).await
    }

    async fn create_session(&self, session: Session) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_session(session).await
    }

    async fn update_session(
        &self,
        session_id: &str,
        update: SessionUpdate,
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update_session(session_id, update).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_session(session_id).await
    }
}

#[tokio::test]
async fn sign_out_without_a_token_touches_no_storage() {
    let adapter = Arc::new(CountingAdapter::new());
    let auth = engine_with(adapter.clone());

    auth.sign_out(&axum::http::HeaderMap::new()).await.unwrap();
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
}

/// Adapter whose session lookups always fail.
struct FailingAdapter;

#[async_trait]
impl Adapter for FailingAdapter {
    async fn get_user_by_id(&self, _id: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn get_user_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn create_user(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn get_account(
        &self,
        _provider: &str,
        _provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn create_account(&self, _account: Account) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn get_session_with_user(
        &self,
        _session_id: &str,
    ) -> Result<Option<(Session, User)>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn create_session(&self, _session: Session) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn update_session(
        &self,
        _session_id: &str,
        _update: SessionUpdate,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn delete_session(&self, _session_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

#[tokio::test]
async fn storage_failure_is_500_without_detail() {
    let app = app(engine_with(Arc::new(FailingAdapter)));

    let response = app
        .oneshot(get(
            "/get-session",
            Some("janua_session=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA.BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body, json!({"error": "internal error"}));
}

#[tokio::test]
async fn sessions_record_client_metadata() {
    let adapter = Arc::new(MemoryAdapter::new());
    let auth = engine_with(adapter);

    let client = ClientInfo {
        ip: Some("203.0.113.9".to_string()),
        user_agent: Some("integration-test".to_string()),
    };
    let signed_in = auth
        .sign_up_credentials("Ada", "ada@example.com", "correct horse", &client)
        .await
        .unwrap();
    assert_eq!(signed_in.session.ip.as_deref(), Some("203.0.113.9"));
    assert_eq!(
        signed_in.session.user_agent.as_deref(),
        Some("integration-test")
    );
}
