//! Argon2id password hashing for credentials accounts.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use tracing::debug;

/// Hash a plaintext password into a PHC string.
///
/// Each call draws a fresh salt, so hashing the same password twice yields
/// different strings.
///
/// # Errors
/// Returns an error if the hasher rejects its parameters; never leaks the
/// plaintext in the error.
pub fn hash(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)?
        .to_string())
}

/// Verify a plaintext password against a stored PHC string.
///
/// Fails closed: a malformed stored hash verifies as `false` rather than
/// surfacing an error a caller could mishandle. The underlying comparison is
/// constant time.
#[must_use]
pub fn verify(stored: &str, plain: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        debug!("Stored password hash is malformed; treating as mismatch");
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
