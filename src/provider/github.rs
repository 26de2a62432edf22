//! GitHub OAuth provider.

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use super::{
    OAuth2Client, OAuth2Config, OAuthProvider, ProviderExchangeError, UserData, optional_str,
    required_str,
};

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USERINFO_URL: &str = "https://api.github.com/user";

pub struct GitHub {
    client: OAuth2Client,
}

impl GitHub {
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
            vec!["read:user".to_string(), "user:email".to_string()],
        );
        Self {
            client: OAuth2Client::new(config),
        }
    }

    /// Override endpoints, for tests or GitHub Enterprise.
    #[must_use]
    pub fn with_config(config: OAuth2Config) -> Self {
        Self {
            client: OAuth2Client::new(config),
        }
    }

    fn normalize(profile: &serde_json::Value) -> Result<UserData, ProviderExchangeError> {
        // GitHub ids are numeric in the API response.
        let id = profile
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .map(|id| id.to_string())
            .ok_or_else(|| ProviderExchangeError::Profile("missing field: id".to_string()))?;
        // `email` is null unless the user exposes a public email.
        let email = required_str(profile, "email")?;
        let name =
            optional_str(profile, "name").or_else(|| optional_str(profile, "login")).unwrap_or_default();
        Ok(UserData {
            id,
            name,
            email,
            image: optional_str(profile, "avatar_url"),
        })
    }
}

#[async_trait]
impl OAuthProvider for GitHub {
    fn id(&self) -> &'static str {
        "github"
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
