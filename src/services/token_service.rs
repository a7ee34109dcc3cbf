use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::prelude::*;
use sha2::Sha256;

use crate::errors::internal::CredentialError;
use crate::errors::InternalError;
use crate::types::internal::auth::Claims;

type HmacSha256 = Hmac<Sha256>;

const JWT_EXPIRATION_MINUTES: i64 = 15;
const REFRESH_EXPIRATION_DAYS: i64 = 7;

/// Manages JWT access token generation/validation and refresh token material
pub struct TokenService {
    jwt_secret: String,
    refresh_token_secret: String,
}

impl TokenService {
    pub fn new(jwt_secret: String, refresh_token_secret: String) -> Self {
        Self {
            jwt_secret,
            refresh_token_secret,
        }
    }

    /// Generate a JWT access token for the given user ID
    pub fn generate_jwt(&self, user_id: &str) -> Result<String, InternalError> {
        let now = Utc::now().timestamp();
        let expiration = now + (JWT_EXPIRATION_MINUTES * 60);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| InternalError::crypto("generate_jwt", e.to_string()))
    }

    /// Validate a JWT access token and return the claims
    pub fn validate_jwt(&self, token: &str) -> Result<Claims, InternalError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            if matches!(
                e.kind(),
                jsonwebtoken::errors::ErrorKind::ExpiredSignature
            ) {
                InternalError::Credential(CredentialError::ExpiredToken("jwt".to_string()))
            } else {
                InternalError::Credential(CredentialError::InvalidToken {
                    token_type: "jwt".to_string(),
                    reason: e.to_string(),
                })
            }
        })?;

        Ok(token_data.claims)
    }

    /// Generate a cryptographically secure refresh token
    ///
    /// Returns a base64-encoded random token (32 bytes). Only its
    /// HMAC-SHA256 hash is ever persisted.
    pub fn generate_refresh_token(&self) -> String {
        let mut rng = rand::rng();
        let random_bytes: [u8; 32] = rng.random();
        general_purpose::STANDARD.encode(random_bytes)
    }

    /// Hash a refresh token with HMAC-SHA256, returning a hex string
    pub fn hash_refresh_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.refresh_token_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(token.as_bytes());
        let result = mac.finalize();
        format!("{:x}", result.into_bytes())
    }

    /// Access token lifetime in seconds, for `expires_in` response fields
    pub fn access_token_ttl_seconds(&self) -> i64 {
        JWT_EXPIRATION_MINUTES * 60
    }

    /// Expiry timestamp for a refresh token issued now
    pub fn refresh_token_expiry(&self) -> i64 {
        Utc::now().timestamp() + REFRESH_EXPIRATION_DAYS * 24 * 60 * 60
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("jwt_secret", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-jwt-secret".to_string(),
            "test-refresh-secret".to_string(),
        )
    }

    #[test]
    fn test_generate_and_validate_jwt() {
        let svc = service();
        let user_id = "1c9ff10f-6c25-44b8-9b3f-9cf35e7c0909";

        let token = svc.generate_jwt(user_id).expect("generation failed");
        let claims = svc.validate_jwt(&token).expect("validation failed");

        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_validate_rejects_wrong_secret() {
        let svc = service();
        let other = TokenService::new(
            "a-different-secret".to_string(),
            "test-refresh-secret".to_string(),
        );

        let token = svc.generate_jwt("some-user").unwrap();
        let result = other.validate_jwt(&token);

        assert!(matches!(
            result,
            Err(InternalError::Credential(CredentialError::InvalidToken { .. }))
        ));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let svc = service();
        assert!(svc.validate_jwt("not.a.jwt").is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let svc = service();
        assert_ne!(svc.generate_refresh_token(), svc.generate_refresh_token());
    }

    #[test]
    fn test_refresh_token_hash_is_stable() {
        let svc = service();
        let token = svc.generate_refresh_token();

        assert_eq!(svc.hash_refresh_token(&token), svc.hash_refresh_token(&token));
        assert_ne!(svc.hash_refresh_token(&token), token);
    }
}
