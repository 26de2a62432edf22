//! Secret generation, digesting, and comparison primitives.
//!
//! Everything here operates on high-entropy material (session ids, session
//! secrets, OAuth state, PKCE verifiers). Password hashing is separate, see
//! [`crate::password`], because passwords are low-entropy and need a slow KDF.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Bytes of entropy behind every generated secret (256 bits).
const SECRET_BYTES: usize = 32;

/// Generate a URL-safe random string from the OS CSPRNG.
///
/// Used for session ids, session secrets, OAuth `state`, and PKCE code
/// verifiers. The base64url alphabet never contains `.`, so values compose
/// safely into `id.secret` bearer tokens.
#[must_use]
pub fn generate_secure_string() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a session secret for storage.
///
/// The raw secret never touches the store; lookups hash the presented secret
/// and compare against this value. SHA-256 is enough here because the input
/// already carries 256 bits of entropy.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    encode_hex(&hasher.finalize())
}

/// Encode bytes as a lowercase hex string.
#[must_use]
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string back into bytes.
///
/// # Errors
/// Returns an error if the input is not valid hex.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(value)
}

/// Constant-time equality for secret material.
///
/// Length is public (a mismatch returns early), the content comparison is
/// constant time. Never compare secret hashes with `==`.
#[must_use]
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Generate an OAuth `state` value.
#[must_use]
pub fn generate_state() -> String {
    generate_secure_string()
}

/// Generate a PKCE code verifier (RFC 7636: 43-128 URL-safe chars).
#[must_use]
pub fn generate_code_verifier() -> String {
    generate_secure_string()
}

/// Compute the S256 code challenge for a PKCE verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
#[must_use]
pub fn code_challenge_s256(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}
