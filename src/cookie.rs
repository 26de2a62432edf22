//! Minimal cookie codec for `Cookie` / `Set-Cookie` headers.
//!
//! Values are URL-encoded on the wire. Parsing is forgiving: pairs without an
//! `=` or with an empty name are skipped, never fatal.

use std::collections::HashMap;

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// Attributes attached to a serialized cookie.
///
/// Boolean attributes (`HttpOnly`, `Secure`) emit bare when `true` and are
/// omitted when `false`; valued attributes emit as `Key=Value`.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    path: Option<String>,
    domain: Option<String>,
    max_age: Option<i64>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

impl CookieOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Parse a `Cookie` request header into name → URL-decoded value.
///
/// An empty header yields an empty map. A name that repeats keeps the first
/// occurrence, matching how user agents order cookies by specificity.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let trimmed = pair.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((name, value)) = trimmed.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        let decoded = urlencoding::decode(value)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| value.to_string());
        cookies.entry(name.to_string()).or_insert(decoded);
    }
    cookies
}

/// Serialize one `Set-Cookie` header value.
#[must_use]
pub fn serialize_cookie(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut cookie = format!("{name}={}", urlencoding::encode(value));
    if let Some(path) = &options.path {
        cookie.push_str("; Path=");
        cookie.push_str(path);
    }
    if let Some(domain) = &options.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if let Some(max_age) = options.max_age {
        cookie.push_str("; Max-Age=");
        cookie.push_str(&max_age.to_string());
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str("; SameSite=");
        cookie.push_str(same_site.as_str());
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_header() {
        assert!(parse_cookies("").is_empty());
        assert!(parse_cookies("   ").is_empty());
    }

    #[test]
    fn parse_skips_malformed_pairs() {
        let cookies = parse_cookies("a=1; garbage; =nameless; b=2;");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn parse_url_decodes_values() {
        let cookies = parse_cookies("redirect=https%3A%2F%2Fapp.example%2Fhome");
        assert_eq!(
            cookies.get("redirect").map(String::as_str),
            Some("https://app.example/home")
        );
    }

    #[test]
    fn serialize_encodes_value_and_orders_attributes() {
        let options = CookieOptions::new()
            .with_path("/")
            .with_max_age(10)
            .with_http_only(true)
            .with_same_site(SameSite::Lax);
        let cookie = serialize_cookie("k", "v v", &options);
        assert_eq!(cookie, "k=v%20v; Path=/; Max-Age=10; SameSite=Lax; HttpOnly");
    }

    #[test]
    fn false_booleans_are_omitted() {
        let cookie = serialize_cookie("k", "v", &CookieOptions::new());
        assert_eq!(cookie, "k=v");
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn round_trip_through_parse() {
        let options = CookieOptions::new().with_http_only(true).with_max_age(10);
        let serialized = serialize_cookie("k", "v", &options);
        // A Set-Cookie value's leading pair is what comes back in Cookie headers.
        let cookies = parse_cookies(&serialized);
        assert_eq!(cookies.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn secure_and_domain_emit() {
        let options = CookieOptions::new()
            .with_secure(true)
            .with_domain("janua.dev");
        let cookie = serialize_cookie("k", "v", &options);
        assert!(cookie.contains("; Domain=janua.dev"));
        assert!(cookie.ends_with("; Secure"));
    }
}
