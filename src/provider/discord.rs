//! Discord OAuth provider.

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use super::{
    OAuth2Client, OAuth2Config, OAuthProvider, ProviderExchangeError, UserData, optional_str,
    required_str,
};

const AUTH_URL: &str = "https://discord.com/oauth2/authorize";
const TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const USERINFO_URL: &str = "https://discord.com/api/users/@me";

pub struct Discord {
    client: OAuth2Client,
}

impl Discord {
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
            vec!["identify".to_string(), "email".to_string()],
        );
        Self {
            client: OAuth2Client::new(config),
        }
    }

    /// Override endpoints, for tests.
    #[must_use]
    pub fn with_config(config: OAuth2Config) -> Self {
        Self {
            client: OAuth2Client::new(config),
        }
    }

    fn normalize(profile: &serde_json::Value) -> Result<UserData, ProviderExchangeError> {
        let id = required_str(profile, "id")?;
        let image = optional_str(profile, "avatar")
            .map(|avatar| format!("https://cdn.discordapp.com/avatars/{id}/{avatar}.png"));
        Ok(UserData {
            name: optional_str(profile, "global_name")
                .or_else(|| optional_str(profile, "username"))
                .unwrap_or_default(),
            email: required_str(profile, "email")?,
            image,
            id,
        })
    }
}

#[async_trait]
impl OAuthProvider for Discord {
    fn id(&self) -> &'static str {
        "discord"
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
