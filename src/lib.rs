//! # Janua (Lightweight Authentication Core)
//!
//! `janua` is an embeddable authentication engine: cookie/bearer sessions,
//! email+password credentials, and OAuth2 authorization-code sign-in with
//! PKCE, served over a small axum API.
//!
//! ## Sessions
//!
//! A session is transported as an opaque `sessionId.secret` bearer token, in
//! the session cookie or the `Authorization` header. Only the SHA-256 of the
//! secret is persisted; validation recomputes the hash and compares it in
//! constant time. Expired or forged tokens degrade to "no session" and the
//! stored record is deleted.
//!
//! Alongside the stateful session, a short-lived JWT access token (subject =
//! user id) allows verification without a store lookup.
//!
//! ## Storage
//!
//! Persistence is behind the [`store::Adapter`] trait; the crate ships an
//! in-memory adapter for tests and single-process deployments. Embedders
//! bring their own backend by implementing the trait.
//!
//! ## Providers
//!
//! OAuth providers implement [`provider::OAuthProvider`]; Google, GitHub, and
//! Discord are built in. The callback leg links provider accounts to existing
//! users by verified email, or creates the user on first sign-in.

pub mod api;
pub mod cli;
pub mod cookie;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod password;
pub mod provider;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
