use axum::{
    Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::apply_cookies;
use crate::engine::{Auth, SetCookies};
use crate::error::AuthError;

#[utoipa::path(
    post,
    path = "/sign-out",
    responses(
        (status = 204, description = "Session terminated (idempotent); session cookies cleared")
    ),
    tag = "session"
)]
pub async fn sign_out(
    auth: Extension<Arc<Auth>>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    auth.sign_out(&headers).await?;

    // Cookies are cleared even when there was nothing to sign out of.
    let mut cookies = SetCookies::new();
    cookies.clear_session(auth.config());
    Ok(apply_cookies(
        StatusCode::NO_CONTENT.into_response(),
        cookies,
    ))
}
