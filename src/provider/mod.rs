//! OAuth2 identity provider abstraction.
//!
//! A provider is anything that can build a consent-redirect URL and exchange
//! an authorization code (plus PKCE verifier) for a normalized user profile.
//! Concrete providers share one authorization-code client and differ only in
//! endpoints and profile normalization.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub mod discord;
pub mod github;
pub mod google;

pub use discord::Discord;
pub use github::GitHub;
pub use google::Google;

/// Upstream provider failure: network, non-2xx exchange, or a profile the
/// normalizer cannot use.
#[derive(Debug, Error)]
pub enum ProviderExchangeError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("provider profile unusable: {0}")]
    Profile(String),
}

/// Provider profile normalized to the fields the engine needs.
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

/// External identity provider capability set.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Stable provider id used in routes and account records (`"google"`).
    fn id(&self) -> &'static str;

    /// Build the consent-redirect URL embedding `state` and the S256 PKCE
    /// challenge derived from the caller-held verifier.
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String;

    /// Exchange the authorization code (plus verifier) for a normalized
    /// profile.
    async fn fetch_user_data(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<UserData, ProviderExchangeError>;
}

/// Provider endpoint configuration.
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    client_id: String,
    client_secret: SecretString,
    redirect_uri: Url,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
    scopes: Vec<String>,
}

impl OAuth2Config {
    /// Endpoint configuration for one provider. Defaults come from the
    /// concrete provider constructors; overrides are for self-hosted or
    /// mock endpoints.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: SecretString,
        redirect_uri: Url,
        auth_url: Url,
        token_url: Url,
        userinfo_url: Url,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri,
            auth_url,
            token_url,
            userinfo_url,
            scopes,
        }
    }

    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

/// Token endpoint response. Only `access_token` is required reading.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Shared authorization-code + PKCE client.
#[derive(Debug, Clone)]
pub(crate) struct OAuth2Client {
    config: OAuth2Config,
    http: reqwest::Client,
}

impl OAuth2Client {
    pub(crate) fn new(config: OAuth2Config) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub(crate) fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256");
        url.into()
    }

    /// Exchange the code for an access token, then fetch the raw profile JSON
    /// from the userinfo endpoint.
    pub(crate) async fn fetch_profile(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<serde_json::Value, ProviderExchangeError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", &self.config.client_id),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("code_verifier", code_verifier),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, crate::APP_USER_AGENT)
            .form(&params)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderExchangeError::Status(response.status()));
        }
        let token: TokenResponse = response.json().await?;

        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, crate::APP_USER_AGENT)
            .header(AUTHORIZATION, format!("Bearer {}", token.access_token))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderExchangeError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}

/// Pull a required string field out of a raw profile.
fn required_str(profile: &serde_json::Value, field: &str) -> Result<String, ProviderExchangeError> {
    profile
        .get(field)
        .and_then(serde_json::Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| ProviderExchangeError::Profile(format!("missing field: {field}")))
}

fn optional_str(profile: &serde_json::Value, field: &str) -> Option<String> {
    profile
        .get(field)
        .and_then(serde_json::Value::as_str)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}
