//! `Set-Cookie` header construction for the engine's cookie surface.

use crate::cookie::{CookieOptions, SameSite, serialize_cookie};

use super::SessionTokens;
use super::config::AuthConfig;

/// Ordered list of `Set-Cookie` values for one response.
#[derive(Debug, Clone, Default)]
pub struct SetCookies(Vec<String>);

impl SetCookies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn into_headers(self) -> Vec<String> {
        self.0
    }

    fn push(&mut self, cookie: String) {
        self.0.push(cookie);
    }

    /// Session and access cookies for a fresh sign-in. Both are `HttpOnly`
    /// and scoped to the whole site; `Secure` follows the base URL scheme.
    pub fn set_session(&mut self, config: &AuthConfig, tokens: &SessionTokens) {
        let base = CookieOptions::new()
            .with_path("/")
            .with_http_only(true)
            .with_secure(config.cookie_secure())
            .with_same_site(SameSite::Lax);
        self.push(serialize_cookie(
            config.session_cookie(),
            &tokens.session_token,
            &base.clone().with_max_age(config.session_ttl_seconds()),
        ));
        self.push(serialize_cookie(
            config.access_cookie(),
            &tokens.access_token,
            &base.with_max_age(config.access_token_ttl_seconds()),
        ));
    }

    /// Expire the session and access cookies (sign-out).
    pub fn clear_session(&mut self, config: &AuthConfig) {
        for name in [config.session_cookie(), config.access_cookie()] {
            self.push(serialize_cookie(
                name,
                "",
                &CookieOptions::new()
                    .with_path("/")
                    .with_http_only(true)
                    .with_secure(config.cookie_secure())
                    .with_same_site(SameSite::Lax)
                    .with_max_age(0),
            ));
        }
    }

    /// Short-lived state/verifier/redirect cookies set when an OAuth flow
    /// starts. Scoped to the engine mount path so they never travel with
    /// unrelated requests.
    pub fn set_oauth_transient(
        &mut self,
        config: &AuthConfig,
        state: &str,
        code_verifier: &str,
        redirect: &str,
    ) {
        let options = CookieOptions::new()
            .with_path(config.base_path())
            .with_http_only(true)
            .with_secure(config.cookie_secure())
            .with_same_site(SameSite::Lax)
            .with_max_age(config.transient_ttl_seconds());
        self.push(serialize_cookie(config.state_cookie(), state, &options));
        self.push(serialize_cookie(
            config.verifier_cookie(),
            code_verifier,
            &options,
        ));
        self.push(serialize_cookie(
            config.redirect_cookie(),
            redirect,
            &options,
        ));
    }

    /// Expire the transient OAuth cookies after the callback consumed them.
    pub fn clear_oauth_transient(&mut self, config: &AuthConfig) {
        let options = CookieOptions::new()
            .with_path(config.base_path())
            .with_http_only(true)
            .with_secure(config.cookie_secure())
            .with_same_site(SameSite::Lax)
            .with_max_age(0);
        for name in [
            config.state_cookie(),
            config.verifier_cookie(),
            config.redirect_cookie(),
        ] {
            self.push(serialize_cookie(name, "", &options));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> SessionTokens {
        SessionTokens {
            session_token: "sid.secret".to_string(),
            access_token: "jwt".to_string(),
        }
    }

    #[test]
    fn session_cookies_are_http_only_and_secure_over_https() {
        let config = AuthConfig::new("https://app.example");
        let mut cookies = SetCookies::new();
        cookies.set_session(&config, &tokens());
        let headers = cookies.into_headers();
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("janua_session=sid.secret;"));
        assert!(headers[0].contains("HttpOnly"));
        assert!(headers[0].contains("Secure"));
        assert!(headers[0].contains("Path=/;"));
        assert!(headers[1].starts_with("janua_access=jwt;"));
    }

    #[test]
    fn secure_is_dropped_over_plain_http() {
        let config = AuthConfig::new("http://localhost:8080");
        let mut cookies = SetCookies::new();
        cookies.set_session(&config, &tokens());
        for header in cookies.into_headers() {
            assert!(!header.contains("Secure"));
        }
    }

    #[test]
    fn clearing_expires_both_session_cookies() {
        let config = AuthConfig::new("https://app.example");
        let mut cookies = SetCookies::new();
        cookies.clear_session(&config);
        let headers = cookies.into_headers();
        assert_eq!(headers.len(), 2);
        for header in &headers {
            assert!(header.contains("Max-Age=0"));
        }
    }

    #[test]
    fn transient_cookies_are_scoped_to_the_mount_path() {
        let config = AuthConfig::new("https://app.example");
        let mut cookies = SetCookies::new();
        cookies.set_oauth_transient(&config, "state", "verifier", "/after");
        let headers = cookies.into_headers();
        assert_eq!(headers.len(), 3);
        assert!(headers[0].starts_with("janua_state=state;"));
        assert!(headers[1].starts_with("janua_verifier=verifier;"));
        assert!(headers[2].starts_with("janua_redirect=%2Fafter;"));
        for header in &headers {
            assert!(header.contains("Path=/api/auth;"));
            assert!(header.contains("Max-Age=300;"));
        }
    }
}
