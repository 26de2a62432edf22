//! Persistence contract consumed by the auth engine.
//!
//! The engine never talks to a database directly; it is constructed with an
//! [`Adapter`] and treats it as an opaque capability. The adapter owns all
//! locking/transaction discipline for its backing store. Backend failures
//! must surface as [`StoreError`], never be swallowed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use utoipa::ToSchema;

pub mod memory;

pub use memory::MemoryAdapter;

/// Adapter failure, surfaced to callers as a 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    /// Uniqueness violation (duplicate email or account identity).
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Identity record. Owned by the adapter; the engine only creates, never
/// mutates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields the engine supplies when creating a user; the adapter assigns the
/// id and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

/// Linkage between a user and one authentication method.
///
/// `(provider, provider_account_id)` is unique. The password hash is present
/// only for the `credentials` provider.
#[derive(Debug, Clone)]
pub struct Account {
    pub provider: String,
    pub provider_account_id: String,
    pub user_id: String,
    pub password_hash: Option<String>,
}

/// Server-side session record. Stores only the hash of the bearer secret, so
/// a storage compromise cannot be replayed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub secret_hash: String,
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Partial session update; only set fields are written.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub expires_at: Option<i64>,
}

/// Storage operations the engine depends on. All methods are async single
/// suspend points; the engine does not retry failures.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn create_account(&self, account: Account) -> Result<(), StoreError>;

    async fn get_session_with_user(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, User)>, StoreError>;

    async fn create_session(&self, session: Session) -> Result<(), StoreError>;

    async fn update_session(
        &self,
        session_id: &str,
        update: SessionUpdate,
    ) -> Result<(), StoreError>;

    async fn delete_session(&self, session_id: &str) -> Result<(), StoreError>;
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
