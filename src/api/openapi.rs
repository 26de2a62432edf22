//! OpenAPI document assembled from the `#[utoipa::path]` handler annotations.

use axum::Json;
use utoipa::OpenApi;

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::session::get_session,
        handlers::sign_in::sign_in,
        handlers::sign_up::sign_up,
        handlers::sign_out::sign_out,
        handlers::oauth::oauth_start,
        handlers::oauth::oauth_callback,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::session::SessionResponse,
        handlers::sign_in::SignInRequest,
        handlers::sign_in::SignedInResponse,
        handlers::sign_up::SignUpRequest,
        crate::store::Session,
        crate::store::User,
    )),
    tags(
        (name = "session", description = "Session lookup and termination"),
        (name = "credentials", description = "Email/password sign-in and sign-up"),
        (name = "oauth", description = "OAuth2 authorization-code flow"),
        (name = "health", description = "Build and liveness info"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}
