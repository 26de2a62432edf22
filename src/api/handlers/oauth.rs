use axum::{
    Extension, Form,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{apply_cookies, client_info, cookie_value};
use crate::engine::{Auth, OAuthCallback, SetCookies};
use crate::error::AuthError;

#[derive(Deserialize, Debug)]
pub struct StartQuery {
    /// Where to send the browser after the callback completes.
    pub redirect: Option<String>,
}

#[derive(Deserialize, Debug, utoipa::ToSchema)]
pub struct CallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
    /// Set by the provider when the user denied consent.
    pub error: Option<String>,
}

impl CallbackQuery {
    /// Providers using `response_mode=form_post` deliver the parameters in
    /// the request body; query-string values win when both are present.
    fn merge(self, other: Self) -> Self {
        Self {
            state: self.state.or(other.state),
            code: self.code.or(other.code),
            error: self.error.or(other.error),
        }
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

#[utoipa::path(
    get,
    path = "/{provider}",
    params(("provider" = String, Path, description = "Registered provider id")),
    responses(
        (status = 302, description = "Redirect to the provider's consent page; transient state cookies set"),
        (status = 400, description = "Unknown provider")
    ),
    tag = "oauth"
)]
pub async fn oauth_start(
    auth: Extension<Arc<Auth>>,
    Path(provider): Path<String>,
    Query(query): Query<StartQuery>,
) -> Result<Response, AuthError> {
    let start = auth.oauth_start(&provider, query.redirect.as_deref())?;

    let mut cookies = SetCookies::new();
    cookies.set_oauth_transient(
        auth.config(),
        &start.state,
        &start.code_verifier,
        &start.redirect_uri,
    );
    Ok(apply_cookies(found(&start.authorization_url), cookies))
}

#[utoipa::path(
    get,
    path = "/{provider}/callback",
    description = "Completes the provider flow; also accepts a form-encoded POST body for providers using response_mode=form_post",
    params(
        ("provider" = String, Path, description = "Registered provider id"),
        ("state" = Option<String>, Query, description = "Anti-forgery state from the start leg"),
        ("code" = Option<String>, Query, description = "Authorization code")
    ),
    responses(
        (status = 302, description = "Signed in; redirect to the stashed target with session cookies set"),
        (status = 401, description = "State mismatch"),
        (status = 400, description = "Missing code or consent denied")
    ),
    tag = "oauth"
)]
pub async fn oauth_callback(
    auth: Extension<Arc<Auth>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
    form: Option<Form<CallbackQuery>>,
) -> Result<Response, AuthError> {
    let query = match form {
        Some(Form(body)) => query.merge(body),
        None => query,
    };
    if let Some(error) = query.error {
        return Err(AuthError::BadRequest(format!("provider error: {error}")));
    }

    let config = auth.config();
    let callback = OAuthCallback {
        state: query.state,
        code: query.code,
        cookie_state: cookie_value(&headers, config.state_cookie()),
        cookie_verifier: cookie_value(&headers, config.verifier_cookie()),
        cookie_redirect: cookie_value(&headers, config.redirect_cookie()),
    };
    let client = client_info(&headers);

    let outcome = auth.oauth_callback(&provider, callback, &client).await?;

    let mut cookies = SetCookies::new();
    cookies.set_session(config, &outcome.signed_in.tokens);
    cookies.clear_oauth_transient(config);
    Ok(apply_cookies(found(&outcome.redirect), cookies))
}
