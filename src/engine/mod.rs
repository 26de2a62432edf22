//! Auth engine: session, credential, and OAuth flow orchestration.
//!
//! The engine is constructed with everything it depends on — storage adapter,
//! token signer, provider registry — and holds no ambient global state. One
//! engine instance serves all requests; per-request memoization of the
//! session lookup lives in the HTTP layer's `CurrentSession` extractor.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::config::AuthConfig;
use crate::error::AuthError;
use crate::provider::OAuthProvider;
use crate::store::{Adapter, Session, User};
use crate::token::TokenSigner;

pub mod config;
mod cookies;
mod credentials;
mod oauth;
mod session;

pub use cookies::SetCookies;
pub use oauth::{OAuthCallback, OAuthCallbackOutcome, OAuthStart};

/// A validated session together with its owning user.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub session: Session,
    pub user: User,
}

/// Transport tokens minted alongside a new session: the stateful
/// `id.secret` bearer token and the stateless access JWT.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub session_token: String,
    pub access_token: String,
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub session: Session,
    pub tokens: SessionTokens,
}

/// Request metadata recorded on new sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct Auth {
    adapter: Arc<dyn Adapter>,
    config: AuthConfig,
    signer: TokenSigner,
    providers: HashMap<&'static str, Arc<dyn OAuthProvider>>,
}

impl Auth {
    #[must_use]
    pub fn new(adapter: Arc<dyn Adapter>, config: AuthConfig, signer: TokenSigner) -> Self {
        Self {
            adapter,
            config,
            signer,
            providers: HashMap::new(),
        }
    }

    /// Register an identity provider under its stable id.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.providers.insert(provider.id(), provider);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub(crate) fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub(crate) fn provider(&self, id: &str) -> Result<&Arc<dyn OAuthProvider>, AuthError> {
        self.providers
            .get(id)
            .ok_or_else(|| AuthError::BadRequest(format!("unknown provider: {id}")))
    }
}
