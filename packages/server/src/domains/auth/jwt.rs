use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::common::AdminUserId;

/// Lifetime of tokens minted by [`JwtService::create_token`].
pub const TOKEN_TTL_HOURS: i64 = 12;

/// Claims carried by an admin session token.
///
/// The hosted auth backend mints these after its email OTP login; the subject
/// is the identity id, which doubles as the `admin_users` primary key.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: AdminUserId,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// HS256 signer/verifier over the secret shared with the auth backend.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Mint a token the way the auth backend does. Used by tooling and tests.
    pub fn create_token(&self, user_id: AdminUserId, email: &str, is_admin: bool) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            is_admin,
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Checks signature, algorithm, issuer and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid session token")?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str, issuer: &str) -> JwtService {
        JwtService::new(secret, issuer.to_string())
    }

    #[test]
    fn test_create_and_verify_token() {
        let jwt = service("test_secret_key", "test_issuer");
        let user_id = AdminUserId::new();

        let token = jwt.create_token(user_id, "owner@example.com", true).unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "owner@example.com");
        assert!(claims.is_admin);
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn test_garbage_token() {
        assert!(service("test_secret_key", "test_issuer")
            .verify_token("invalid_token")
            .is_err());
    }

    #[test]
    fn test_wrong_secret_or_issuer() {
        let token = service("secret1", "test_issuer")
            .create_token(AdminUserId::new(), "a@example.com", true)
            .unwrap();

        assert!(service("secret2", "test_issuer").verify_token(&token).is_err());
        assert!(service("secret1", "other_issuer").verify_token(&token).is_err());
    }

    #[test]
    fn test_missing_admin_claim_means_not_admin() {
        #[derive(Serialize)]
        struct BackendClaims {
            sub: AdminUserId,
            email: &'static str,
            exp: i64,
            iat: i64,
            iss: &'static str,
        }

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &BackendClaims {
                sub: AdminUserId::new(),
                email: "crew@example.com",
                exp: now + 60,
                iat: now,
                iss: "test_issuer",
            },
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let claims = service("secret", "test_issuer").verify_token(&token).unwrap();
        assert!(!claims.is_admin);
    }

    #[test]
    fn test_expiry_is_set() {
        let jwt = service("test_secret_key", "test_issuer");
        let token = jwt
            .create_token(AdminUserId::new(), "a@example.com", false)
            .unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        let expires_in = claims.exp - Utc::now().timestamp();
        assert!(expires_in > (TOKEN_TTL_HOURS - 1) * 3600);
        assert!(expires_in <= TOKEN_TTL_HOURS * 3600);
    }
}
