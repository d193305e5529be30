//! Password hashing.
//!
//! Hashes are stored as `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>`,
//! so the iteration count can be raised without invalidating existing
//! accounts.

use base64::{Engine, engine::general_purpose::STANDARD};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

const ALGORITHM: &str = "pbkdf2_sha256";
pub const DEFAULT_ITERATIONS: u32 = 390_000;
const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;

/// Errors raised while reading a stored password hash.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("stored password hash is malformed")]
    Malformed,
    #[error("unsupported password hash algorithm '{0}'")]
    UnsupportedAlgorithm(String),
}

/// Hashes `password` with a fresh random salt and the default work factor.
pub fn hash_password(password: &str) -> String {
    hash_password_with_iterations(password, DEFAULT_ITERATIONS)
}

/// Hashes `password` with an explicit iteration count.
pub fn hash_password_with_iterations(password: &str, iterations: u32) -> String {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = STANDARD.encode(salt_bytes);

    let digest = derive(password, &salt, iterations);
    format!(
        "{}${}${}${}",
        ALGORITHM,
        iterations,
        salt,
        STANDARD.encode(digest)
    )
}

/// Checks `password` against an encoded hash in constant time.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, PasswordError> {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(PasswordError::Malformed);
    };

    if algorithm != ALGORITHM {
        return Err(PasswordError::UnsupportedAlgorithm(algorithm.to_string()));
    }

    let iterations: u32 = iterations.parse().map_err(|_| PasswordError::Malformed)?;
    if iterations == 0 {
        return Err(PasswordError::Malformed);
    }
    let expected = STANDARD
        .decode(expected)
        .map_err(|_| PasswordError::Malformed)?;

    let actual = derive(password, salt, iterations);
    Ok(actual.as_slice().ct_eq(expected.as_slice()).into())
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; HASH_BYTES] {
    let mut out = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let encoded = hash_password_with_iterations("s3cret-pass", 1_000);
        assert!(encoded.starts_with("pbkdf2_sha256$1000$"));
        assert_eq!(verify_password("s3cret-pass", &encoded), Ok(true));
        assert_eq!(verify_password("wrong", &encoded), Ok(false));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password_with_iterations("same", 1_000);
        let b = hash_password_with_iterations("same", 1_000);
        assert_ne!(a, b);
    }

    #[test]
    fn known_vector_verifies() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1, dkLen = 32)
        let encoded = "pbkdf2_sha256$1$salt$Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs=";
        assert_eq!(verify_password("password", encoded), Ok(true));
    }

    #[test]
    fn malformed_hashes_are_rejected() {
        assert_eq!(verify_password("x", "nonsense"), Err(PasswordError::Malformed));
        assert_eq!(
            verify_password("x", "pbkdf2_sha256$abc$salt$AAAA"),
            Err(PasswordError::Malformed)
        );
        assert_eq!(
            verify_password("x", "md5$1$salt$AAAA"),
            Err(PasswordError::UnsupportedAlgorithm("md5".to_string()))
        );
    }
}
