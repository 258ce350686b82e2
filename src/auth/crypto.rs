//! # Cryptographic Utilities
//!
//! Password policy and Argon2id hashing.
//!
//! ## Invariants
//! - Passwords are only stored as Argon2id hashes
//! - Verification compares in constant time (via the argon2 crate)

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::errors::{AuthError, AuthResult};
use crate::validation::FieldErrors;

/// Password requirements configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 100,
        }
    }
}

impl PasswordPolicy {
    /// Record policy violations for `password` under the `password` field
    pub fn check(&self, password: &str, errors: &mut FieldErrors) {
        let length = password.chars().count();
        if length < self.min_length {
            errors.push(
                "password",
                format!(
                    "Password should be at least {} characters long",
                    self.min_length
                ),
            );
        } else if length > self.max_length {
            errors.push(
                "password",
                format!("Password cannot exceed {} characters", self.max_length),
            );
        }
    }
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::HashingFailed)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = "secure_password_123";
        let hash = hash_password(password).unwrap();

        assert_ne!(hash, password);
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_password_hash_produces_unique_hashes() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Salted
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_password_policy_bounds() {
        let policy = PasswordPolicy::default();
        let checked = |password: &str| {
            let mut errors = FieldErrors::new();
            policy.check(password, &mut errors);
            errors.finish()
        };

        assert!(checked("12345").is_err());
        assert!(checked("123456").is_ok());
        assert!(checked(&"x".repeat(100)).is_ok());
        let too_long = checked(&"x".repeat(101)).unwrap_err();
        assert_eq!(too_long[0].field, "password");
    }

    #[test]
    fn test_corrupt_hash_is_internal_error() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AuthError::HashingFailed)
        ));
    }
}
