//! Auth error taxonomy and the single point where errors become responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::provider::ProviderExchangeError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Failures raised by the auth flows.
///
/// Session validation never raises these; it degrades to an anonymous result.
/// Everything else propagates up to the handler layer, which converts it via
/// [`IntoResponse`] exactly once.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Deliberately identical for "no such user" and
    /// "wrong password".
    #[error("invalid credentials")]
    InvalidCredentials,
    /// An operation requiring a session was attempted without one.
    #[error("not authenticated")]
    NotAuthenticated,
    /// OAuth callback `state` did not match the value set at flow start.
    #[error("invalid oauth state")]
    InvalidState,
    /// Malformed request input.
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Provider(#[from] ProviderExchangeError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::NotAuthenticated | Self::InvalidState => {
                StatusCode::UNAUTHORIZED
            }
            Self::Token(TokenError::Creation(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Provider(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Auth flow failed: {self:#}");
        } else {
            debug!("Auth flow rejected: {self}");
        }
        // Internal detail stays in the logs; clients get a stable message.
        let message = match &self {
            Self::Store(_) | Self::Internal(_) | Self::Token(TokenError::Creation(_)) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
