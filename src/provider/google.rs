//! Google OpenID Connect provider.

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use super::{
    OAuth2Client, OAuth2Config, OAuthProvider, ProviderExchangeError, UserData, optional_str,
    required_str,
};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

pub struct Google {
    client: OAuth2Client,
}

impl Google {
    /// # Panics
    /// Never: the default endpoint URLs are statically valid.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: SecretString, redirect_uri: Url) -> Self {
        let config = OAuth2Config::new(
            client_id,
            client_secret,
            redirect_uri,
            AUTH_URL.parse().expect("valid default URL"),
            TOKEN_URL.parse().expect("valid default URL"),
            USERINFO_URL.parse().expect("valid default URL"),
            vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
        );
        Self {
            client: OAuth2Client::new(config),
        }
    }

    /// Override endpoints, for tests or proxied deployments.
    #[must_use]
    pub fn with_config(config: OAuth2Config) -> Self {
        Self {
            client: OAuth2Client::new(config),
        }
    }

    fn normalize(profile: &serde_json::Value) -> Result<UserData, ProviderExchangeError> {
        Ok(UserData {
            id: required_str(profile, "sub")?,
            name: optional_str(profile, "name").unwrap_or_default(),
            email: required_str(profile, "email")?,
            image: optional_str(profile, "picture"),
        })
    }
}

#[async_trait]
impl OAuthProvider for Google {
    fn id(&self) -> &'static str {
        "google"
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        self.client.authorization_url(state, code_challenge)
    }

    async fn fetch_user_data(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<UserData, ProviderExchangeError> {
        let profile = self.client.fetch_profile(code, code_verifier).await?;
        Self::normalize(&profile)
    }
}
