//! OAuth2 authorization-code flow: start and callback.

use url::Url;

use crate::crypto::{code_challenge_s256, generate_code_verifier, generate_state};
use crate::error::AuthError;
use crate::store::{Account, NewUser, User};

use super::{Auth, ClientInfo, SignedIn};

/// Everything the HTTP layer needs to kick off a provider redirect: the
/// consent URL to 302 to, and the transient values to stash in cookies.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub authorization_url: String,
    pub state: String,
    pub code_verifier: String,
    pub redirect_uri: String,
}

/// Raw callback inputs: query parameters plus the transient cookies set at
/// flow start.
#[derive(Debug, Clone, Default)]
pub struct OAuthCallback {
    pub state: Option<String>,
    pub code: Option<String>,
    pub cookie_state: Option<String>,
    pub cookie_verifier: Option<String>,
    pub cookie_redirect: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuthCallbackOutcome {
    pub signed_in: SignedIn,
    /// Final redirect target; carries the tokens as query parameters when it
    /// points at a remote origin or a custom scheme.
    pub redirect: String,
}

impl Auth {
    /// Begin the authorization-code flow for `provider_id`.
    ///
    /// # Errors
    /// [`AuthError::BadRequest`] for an unregistered provider.
    pub fn oauth_start(
        &self,
        provider_id: &str,
        requested_redirect: Option<&str>,
    ) -> Result<OAuthStart, AuthError> {
        let provider = self.provider(provider_id)?;
        let state = generate_state();
        let code_verifier = generate_code_verifier();
        // The verifier stays client-side (cookie); only its S256 challenge
        // goes upstream.
        let authorization_url =
            provider.authorization_url(&state, &code_challenge_s256(&code_verifier));
        let redirect_uri = requested_redirect
            .filter(|value| !value.is_empty())
            .unwrap_or(self.config().base_url())
            .to_string();
        Ok(OAuthStart {
            authorization_url,
            state,
            code_verifier,
            redirect_uri,
        })
    }

    /// Complete the authorization-code flow.
    ///
    /// The `state` check runs before anything else and short-circuits without
    /// touching the provider — it is the CSRF defense.
    ///
    /// # Errors
    /// [`AuthError::InvalidState`] on a state/verifier mismatch,
    /// [`AuthError::BadRequest`] when the code is missing, provider and
    /// storage failures otherwise.
    pub async fn oauth_callback(
        &self,
        provider_id: &str,
        callback: OAuthCallback,
        client: &ClientInfo,
    ) -> Result<OAuthCallbackOutcome, AuthError> {
        let provider = self.provider(provider_id)?;

        match (&callback.state, &callback.cookie_state) {
            (Some(query), Some(cookie)) if query == cookie => {}
            _ => return Err(AuthError::InvalidState),
        }
        let Some(code_verifier) = callback.cookie_verifier.as_deref() else {
            return Err(AuthError::InvalidState);
        };
        let Some(code) = callback.code.as_deref() else {
            return Err(AuthError::BadRequest(
                "missing authorization code".to_string(),
            ));
        };

        let data = provider.fetch_user_data(code, code_verifier).await?;

        let user = self.resolve_oauth_user(provider_id, &data).await?;
        let (session, tokens) = self.create_session_for(&user.id, client).await?;

        let redirect = resolve_redirect(
            self.config().base_url(),
            callback.cookie_redirect.as_deref(),
            &tokens.session_token,
            &tokens.access_token,
        );

        Ok(OAuthCallbackOutcome {
            signed_in: SignedIn {
                user,
                session,
                tokens,
            },
            redirect,
        })
    }

    /// Match by (provider, account id), then by email (account linking),
    /// else create user + account.
    async fn resolve_oauth_user(
        &self,
        provider_id: &str,
        data: &crate::provider::UserData,
    ) -> Result<User, AuthError> {
        if let Some(account) = self.adapter().get_account(provider_id, &data.id).await? {
            return self
                .adapter()
                .get_user_by_id(&account.user_id)
                .await?
                .ok_or_else(|| {
                    AuthError::Internal(anyhow::anyhow!(
                        "account {provider_id}:{} references missing user",
                        data.id
                    ))
                });
        }

        let email = super::credentials::normalize_email(&data.email);
        let user = match self.adapter().get_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                self.adapter()
                    .create_user(NewUser {
                        name: data.name.clone(),
                        email,
                        image: data.image.clone(),
                    })
                    .await?
            }
        };

        self.adapter()
            .create_account(Account {
                provider: provider_id.to_string(),
                provider_account_id: data.id.clone(),
                user_id: user.id.clone(),
                password_hash: None,
            })
            .await?;

        Ok(user)
    }
}

/// Decide the final redirect and whether tokens ride along as query
/// parameters (remote origins and custom schemes cannot read our cookies).
fn resolve_redirect(
    base_url: &str,
    cookie_redirect: Option<&str>,
    session_token: &str,
    access_token: &str,
) -> String {
    let target = cookie_redirect
        .filter(|value| !value.is_empty())
        .unwrap_or(base_url);

    let Ok(mut url) = Url::parse(target) else {
        // Relative path: same-origin by construction, cookies suffice.
        return target.to_string();
    };

    let same_origin = matches!(url.scheme(), "http" | "https")
        && Url::parse(base_url).is_ok_and(|base| base.origin() == url.origin());
    if same_origin {
        // Keep the caller's URL byte-for-byte; parsing was only for the
        // origin check.
        return target.to_string();
    }

    url.query_pairs_mut()
        .append_pair("session_token", session_token)
        .append_pair("access_token", access_token);
    url.into()
}
