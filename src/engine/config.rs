//! Engine configuration: TTLs, cookie names, and mount path.

const DEFAULT_BASE_PATH: &str = "/api/auth";
const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_TRANSIENT_TTL_SECONDS: i64 = 300;

const DEFAULT_SESSION_COOKIE: &str = "janua_session";
const DEFAULT_ACCESS_COOKIE: &str = "janua_access";
const DEFAULT_STATE_COOKIE: &str = "janua_state";
const DEFAULT_VERIFIER_COOKIE: &str = "janua_verifier";
const DEFAULT_REDIRECT_COOKIE: &str = "janua_redirect";

/// Immutable process-wide configuration, read-only after initialization.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    base_url: String,
    base_path: String,
    issuer: String,
    session_ttl_seconds: i64,
    rolling_enabled: bool,
    renew_threshold_seconds: Option<i64>,
    access_token_ttl_seconds: i64,
    transient_ttl_seconds: i64,
    session_cookie: String,
    access_cookie: String,
    state_cookie: String,
    verifier_cookie: String,
    redirect_cookie: String,
}

impl AuthConfig {
    /// `base_url` is where the application (and this engine) is served; it
    /// drives the `Secure` cookie attribute, the default post-login
    /// redirect, and the token issuer.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let issuer = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            base_path: DEFAULT_BASE_PATH.to_string(),
            issuer,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            rolling_enabled: true,
            renew_threshold_seconds: None,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            transient_ttl_seconds: DEFAULT_TRANSIENT_TTL_SECONDS,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            access_cookie: DEFAULT_ACCESS_COOKIE.to_string(),
            state_cookie: DEFAULT_STATE_COOKIE.to_string(),
            verifier_cookie: DEFAULT_VERIFIER_COOKIE.to_string(),
            redirect_cookie: DEFAULT_REDIRECT_COOKIE.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    /// Rolling-expiry policy: when enabled, sessions accessed within the
    /// renewal threshold of expiry get extended back to a full TTL.
    #[must_use]
    pub fn with_rolling_enabled(mut self, enabled: bool) -> Self {
        self.rolling_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_renew_threshold_seconds(mut self, seconds: i64) -> Self {
        self.renew_threshold_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_transient_ttl_seconds(mut self, seconds: i64) -> Self {
        self.transient_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    #[must_use]
    pub fn with_access_cookie(mut self, name: impl Into<String>) -> Self {
        self.access_cookie = name.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn rolling_enabled(&self) -> bool {
        self.rolling_enabled
    }

    /// Renewal threshold; defaults to half the session TTL.
    #[must_use]
    pub fn renew_threshold_seconds(&self) -> i64 {
        self.renew_threshold_seconds
            .unwrap_or(self.session_ttl_seconds / 2)
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn transient_ttl_seconds(&self) -> i64 {
        self.transient_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    #[must_use]
    pub fn access_cookie(&self) -> &str {
        &self.access_cookie
    }

    #[must_use]
    pub fn state_cookie(&self) -> &str {
        &self.state_cookie
    }

    #[must_use]
    pub fn verifier_cookie(&self) -> &str {
        &self.verifier_cookie
    }

    #[must_use]
    pub fn redirect_cookie(&self) -> &str {
        &self.redirect_cookie
    }

    /// Only mark cookies secure when the application is served over HTTPS.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}
