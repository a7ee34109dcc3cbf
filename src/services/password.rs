use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};

use crate::errors::internal::CredentialError;
use crate::errors::InternalError;

/// Handles password hashing and verification
///
/// Uses Argon2id with a server-side pepper as the secret parameter, so a
/// leaked database alone is not enough to brute-force the hashes.
pub struct PasswordService {
    pepper: String,
}

impl PasswordService {
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    fn argon2(&self) -> Result<Argon2<'_>, InternalError> {
        Argon2::new_with_secret(
            self.pepper.as_bytes(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| InternalError::crypto("argon2_init", e.to_string()))
    }

    /// Hash a plaintext password into a PHC-format string
    pub fn hash(&self, password: &str) -> Result<String, InternalError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                InternalError::Credential(CredentialError::PasswordHashingFailed(e.to_string()))
            })?
            .to_string();
        Ok(hash)
    }

    /// Verify a plaintext password against a stored PHC-format hash
    ///
    /// Returns `Ok(false)` on a mismatch; only infrastructure failures
    /// surface as errors.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, InternalError> {
        let parsed_hash = PasswordHash::new(stored_hash)
            .map_err(|e| InternalError::crypto("parse_password_hash", e.to_string()))?;

        match self
            .argon2()?
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(InternalError::crypto("verify_password", e.to_string())),
        }
    }
}

impl std::fmt::Debug for PasswordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordService")
            .field("pepper", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PasswordService {
        PasswordService::new("test-pepper-for-unit-tests".to_string())
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let svc = service();
        let hash = svc.hash("mysecretpassword").expect("hashing failed");

        assert_ne!(hash, "mysecretpassword");
        assert!(hash.starts_with("$argon2id$"));
        assert!(svc.verify("mysecretpassword", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let svc = service();
        let hash = svc.hash("correct-password").expect("hashing failed");

        assert!(!svc.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let svc = service();
        let a = svc.hash("password123").unwrap();
        let b = svc.hash("password123").unwrap();

        // Different salts per hash
        assert_ne!(a, b);
    }

    #[test]
    fn test_pepper_is_part_of_the_hash() {
        let svc = service();
        let other = PasswordService::new("a-different-pepper".to_string());
        let hash = svc.hash("password123").unwrap();

        assert!(!other.verify("password123", &hash).unwrap());
    }

    #[test]
    fn test_debug_redacts_pepper() {
        let svc = service();
        assert!(!format!("{:?}", svc).contains("test-pepper"));
    }
}
