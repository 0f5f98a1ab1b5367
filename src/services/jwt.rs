//! Session tokens.
//!
//! HS256-signed bearer tokens with a configurable expiry. Every business
//! endpoint requires one; login is the only issuer.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    pub username: String,
    pub role: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_expiry_hours: config.token_expiry_hours,
        }
    }

    /// Issue a token for an authenticated user.
    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            exp: (now + Duration::hours(self.token_expiry_hours)).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify a bearer token and return its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_service() -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_expiry_hours: 24,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        })
    }

    fn test_user() -> User {
        User {
            id: 7,
            username: "admin".to_string(),
            password_hash: String::new(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let service = test_service();
        let token = service.issue_token(&test_user()).unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let service = test_service();
        let other = JwtService::new(&AuthConfig {
            jwt_secret: "different-secret".to_string(),
            token_expiry_hours: 24,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        });
        let token = other.issue_token(&test_user()).unwrap();
        assert!(service.verify_token(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(test_service().verify_token("not-a-token").is_err());
    }
}
