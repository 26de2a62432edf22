//! HTTP surface: an axum router mounted under the configured base path.

use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

use crate::engine::Auth;

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

/// Build the router with every route mounted under the engine's base path.
///
/// The canonical routes (`/sign-in`, `/get-session`, ...) are matched before
/// the `/:provider` catch-all, so a provider can never shadow them.
#[must_use]
pub fn router(auth: Arc<Auth>) -> Router {
    let base_path = auth.config().base_path().to_string();

    let routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/openapi.json", get(openapi::openapi_json))
        .route("/get-session", get(handlers::session::get_session))
        .route("/sign-in", post(handlers::sign_in::sign_in))
        .route("/sign-up", post(handlers::sign_up::sign_up))
        .route("/sign-out", post(handlers::sign_out::sign_out))
        .route("/:provider", get(handlers::oauth::oauth_start))
        .route(
            "/:provider/callback",
            get(handlers::oauth::oauth_callback).post(handlers::oauth::oauth_callback),
        );

    Router::new().nest(&base_path, routes).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(middleware::from_fn(preflight_no_content))
            .layer(CorsLayer::permissive())
            .layer(Extension(auth)),
    )
}

/// Bind and serve until the process is stopped.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(port: u16, auth: Arc<Auth>) -> Result<()> {
    let app = router(auth);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// `CorsLayer` answers preflights with 200 OK and offers no status knob;
/// preflights carry no body, so they come back as 204.
async fn preflight_no_content(request: Request<Body>, next: Next) -> Response {
    let options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if options && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::AuthConfig;
    use crate::store::MemoryAdapter;
    use crate::token::TokenSigner;
    use axum::http::StatusCode;
    use secrecy::SecretString;
    use tower::ServiceExt;

    fn test_auth() -> Arc<Auth> {
        Arc::new(Auth::new(
            Arc::new(MemoryAdapter::new()),
            AuthConfig::new("http://localhost:3000"),
            TokenSigner::new(SecretString::from("router-test-secret".to_string())),
        ))
    }

    #[tokio::test]
    async fn unmatched_path_is_404() {
        let app = router(test_auth());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/nope/deep")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_405() {
        let app = router(test_auth());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/get-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn preflight_is_204_with_cors_headers() {
        let app = router(test_auth());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/auth/sign-in")
                    .header("origin", "https://other.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }

    #[tokio::test]
    async fn bare_options_is_204() {
        let app = router(test_auth());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/auth/get-session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id() {
        let app = router(test_auth());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
