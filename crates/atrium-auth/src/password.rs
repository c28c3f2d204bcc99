// SPDX-License-Identifier: Apache-2.0
//! Password hashing (argon2id, PHC strings).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Failure hashing a new password.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed")]
pub struct HashError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a password with argon2id default parameters.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| HashError)
}

/// Constant-time verification against a stored PHC string.
///
/// An unparseable stored hash verifies as `false` rather than erroring, so
/// a corrupt row reads as a failed login instead of a 500.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_original() {
        let hash = hash_password("pw12345678").unwrap();
        assert!(verify_password("pw12345678", &hash));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("pw12345678").unwrap();
        assert!(!verify_password("pw12345679", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("pw12345678", "not-a-phc-string"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("pw12345678").unwrap();
        let b = hash_password("pw12345678").unwrap();
        assert_ne!(a, b);
    }
}
