use axum::{Json, response::IntoResponse};
use serde::Serialize;
use utoipa::ToSchema;

use super::CurrentSession;
use crate::store::{Session, User};

/// `session` and `user` are both present or both `null`; clients check one.
#[derive(ToSchema, Serialize, Debug)]
pub struct SessionResponse {
    session: Option<Session>,
    user: Option<User>,
}

#[utoipa::path(
    get,
    path = "/get-session",
    responses(
        (status = 200, description = "Current session and user, both null when anonymous", body = SessionResponse)
    ),
    tag = "session"
)]
pub async fn get_session(CurrentSession(current): CurrentSession) -> impl IntoResponse {
    let response = match current {
        Some(authenticated) => SessionResponse {
            session: Some(authenticated.session),
            user: Some(authenticated.user),
        },
        None => SessionResponse {
            session: None,
            user: None,
        },
    };
    Json(response)
}
