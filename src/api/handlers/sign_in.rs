use axum::{
    Extension, Json,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{JsonOrForm, apply_cookies, client_info};
use crate::engine::{Auth, SetCookies, SignedIn};
use crate::error::AuthError;
use crate::store::User;

#[derive(ToSchema, Deserialize, Debug)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Tokens mirror the cookies so non-browser clients can store them directly.
#[derive(ToSchema, Serialize, Debug)]
pub struct SignedInResponse {
    pub user: User,
    pub session_token: String,
    pub access_token: String,
}

/// Build the signed-in JSON body and attach the session cookies.
pub(crate) fn signed_in_response(auth: &Auth, signed_in: SignedIn) -> Response {
    let mut cookies = SetCookies::new();
    cookies.set_session(auth.config(), &signed_in.tokens);
    let body = SignedInResponse {
        user: signed_in.user,
        session_token: signed_in.tokens.session_token,
        access_token: signed_in.tokens.access_token,
    };
    apply_cookies(Json(body).into_response(), cookies)
}

#[utoipa::path(
    post,
    path = "/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in; session cookies set", body = SignedInResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "credentials"
)]
pub async fn sign_in(
    auth: Extension<Arc<Auth>>,
    headers: HeaderMap,
    JsonOrForm(body): JsonOrForm<SignInRequest>,
) -> Result<Response, AuthError> {
    let client = client_info(&headers);
    let signed_in = auth
        .sign_in_credentials(&body.email, &body.password, &client)
        .await?;
    Ok(signed_in_response(&auth, signed_in))
}
