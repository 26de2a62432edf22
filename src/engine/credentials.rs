//! Email/password sign-in and sign-up.

use regex::Regex;

use crate::error::AuthError;
use crate::password;
use crate::store::{Account, NewUser};

use super::{Auth, ClientInfo, SignedIn};

/// Provider id used for password accounts.
pub(crate) const CREDENTIALS_PROVIDER: &str = "credentials";

const MIN_PASSWORD_CHARS: usize = 8;

/// Structurally valid PHC string used to equalize work when the email is
/// unknown, so the two `InvalidCredentials` paths cost the same.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Yy9wZXBwZXJzYWx0dmFsdWU$xDmyW8DNzCJHLYYzp1MWaUI1NdQtpwNE9I8VSkTWYmE";

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

impl Auth {
    /// Sign in with email and password.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] for unknown email, missing password
    /// account, or wrong password — all three are indistinguishable to the
    /// caller. Storage failures propagate.
    pub async fn sign_in_credentials(
        &self,
        email: &str,
        plain_password: &str,
        client: &ClientInfo,
    ) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email);

        let Some(user) = self.adapter().get_user_by_email(&email).await? else {
            // Burn the same hashing work as a real verification.
            let _ = password::verify(DUMMY_PASSWORD_HASH, plain_password);
            return Err(AuthError::InvalidCredentials);
        };

        let account = self
            .adapter()
            .get_account(CREDENTIALS_PROVIDER, &user.id)
            .await?;
        let Some(stored_hash) = account.and_then(|account| account.password_hash) else {
            let _ = password::verify(DUMMY_PASSWORD_HASH, plain_password);
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify(&stored_hash, plain_password) {
            return Err(AuthError::InvalidCredentials);
        }

        let (session, tokens) = self.create_session_for(&user.id, client).await?;
        Ok(SignedIn {
            user,
            session,
            tokens,
        })
    }

    /// Register a new credentials user and sign them in.
    ///
    /// # Errors
    /// [`AuthError::BadRequest`] on invalid email shape, short password, or
    /// an email that is already registered. Storage failures propagate.
    pub async fn sign_up_credentials(
        &self,
        name: &str,
        email: &str,
        plain_password: &str,
        client: &ClientInfo,
    ) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            return Err(AuthError::BadRequest("invalid email".to_string()));
        }
        if plain_password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        if self.adapter().get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::BadRequest("email already registered".to_string()));
        }

        let password_hash = password::hash(plain_password)
            .map_err(|err| anyhow::anyhow!("password hashing failed: {err}"))?;

        let user = self
            .adapter()
            .create_user(NewUser {
                name: name.trim().to_string(),
                email: email.clone(),
                image: None,
            })
            .await?;
        self.adapter()
            .create_account(Account {
                provider: CREDENTIALS_PROVIDER.to_string(),
                provider_account_id: user.id.clone(),
                user_id: user.id.clone(),
                password_hash: Some(password_hash),
            })
            .await?;

        let (session, tokens) = self.create_session_for(&user.id, client).await?;
        Ok(SignedIn {
            user,
            session,
            tokens,
        })
    }
}
