//! In-memory adapter for tests and the reference binary.
//!
//! Not a persistence layer: contents vanish with the process. Real
//! deployments implement [`Adapter`] over their own store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use super::{Account, Adapter, NewUser, Session, SessionUpdate, StoreError, User, unix_now};

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    // Keyed by (provider, provider_account_id).
    accounts: HashMap<(String, String), Account>,
    sessions: HashMap<String, Session>,
}

/// `HashMap`-backed [`Adapter`].
#[derive(Default)]
pub struct MemoryAdapter {
    inner: RwLock<Inner>,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live session records. Test hook.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|user| user.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        let now = unix_now();
        let record = User {
            id: Ulid::new().to_string(),
            name: user.name,
            email: user.email,
            image: user.image,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .accounts
            .get(&(provider.to_string(), provider_account_id.to_string()))
            .cloned())
    }

    async fn create_account(&self, account: Account) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (account.provider.clone(), account.provider_account_id.clone());
        if inner.accounts.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "account already linked: {}:{}",
                key.0, key.1
            )));
        }
        inner.accounts.insert(key, account);
        Ok(())
    }

    async fn get_session_with_user(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, User)>, StoreError> {
        let inner = self.inner.read().await;
        let Some(session) = inner.sessions.get(session_id) else {
            return Ok(None);
        };
        let user = inner.users.get(&session.user_id).ok_or_else(|| {
            StoreError::Backend(format!("session {session_id} references missing user"))
        })?;
        Ok(Some((session.clone(), user.clone())))
    }

    async fn create_session(&self, session: Session) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn update_session(
        &self,
        session_id: &str,
        update: SessionUpdate,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let session = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::Backend(format!("no such session: {session_id}")))?;
        if let Some(expires_at) = update.expires_at {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(session_id);
        Ok(())
    }
}
