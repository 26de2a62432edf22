use axum::{Extension, http::HeaderMap, response::Response};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::sign_in::{SignedInResponse, signed_in_response};
use super::{JsonOrForm, client_info};
use crate::engine::Auth;
use crate::error::AuthError;

#[derive(ToSchema, Deserialize, Debug)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Account created and signed in; session cookies set", body = SignedInResponse),
        (status = 400, description = "Invalid email, weak password, or email already registered")
    ),
    tag = "credentials"
)]
pub async fn sign_up(
    auth: Extension<Arc<Auth>>,
    headers: HeaderMap,
    JsonOrForm(body): JsonOrForm<SignUpRequest>,
) -> Result<Response, AuthError> {
    let client = client_info(&headers);
    let signed_in = auth
        .sign_up_credentials(&body.name, &body.email, &body.password, &client)
        .await?;
    Ok(signed_in_response(&auth, signed_in))
}
