use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: Uuid,
    pub username: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Per-token id, so two logins within the same second never share a token.
    pub jti: Uuid,
}

/// Why a token was refused.
#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("{0}")]
    Invalid(String),
}

/// Signs and verifies the short-lived session tokens.
///
/// The signing secret is handed over once at startup. Rotating it invalidates every
/// outstanding token, which is acceptable since tokens only live for minutes.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` against an explicit clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Lifetime of every issued token.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generates a token for the given user, expiring `ttl` from now.
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, AppError> {
        self.issue_at(user_id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let iat = issued_at.timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| AppError::Internal("token lifetime out of range".into()))?;
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and expiry of a token and decodes its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Like [`TokenIssuer::verify`], judging expiry against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Time left before the token expires on its own, never less than one second.
    pub fn remaining_lifetime(&self, claims: &Claims) -> Duration {
        let remaining = claims.exp.saturating_sub(Utc::now().timestamp());
        Duration::from_secs(remaining.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret, FIVE_MINUTES)
    }

    #[test]
    fn test_token_generation_and_verification() {
        let issuer = issuer("test_secret_for_gen_verify");
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id, "alice").unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_tokens_issued_in_the_same_second_differ() {
        let issuer = issuer("test_secret");
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let first = issuer.issue_at(user_id, "alice", now).unwrap();
        let second = issuer.issue_at(user_id, "alice", now).unwrap();
        assert_ne!(first, second);
        assert_ne!(
            issuer.verify(&first).unwrap().jti,
            issuer.verify(&second).unwrap().jti
        );
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let issuer = TokenIssuer::new("test_secret", Duration::from_secs(u64::MAX));
        assert!(matches!(
            issuer.issue(Uuid::new_v4(), "alice"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_token_expires_after_horizon() {
        let issuer = issuer("test_secret_for_expiration");
        let issued_at = Utc::now();
        let token = issuer.issue_at(Uuid::new_v4(), "alice", issued_at).unwrap();

        let just_before = issued_at + ChronoDuration::seconds(299);
        assert!(issuer.verify_at(&token, just_before).is_ok());

        let at_horizon = issued_at + ChronoDuration::seconds(300);
        assert_eq!(issuer.verify_at(&token, at_horizon), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_token_is_rejected_now() {
        let issuer = issuer("test_secret_for_expiration");
        let long_ago = Utc::now() - ChronoDuration::hours(2);
        let token = issuer.issue_at(Uuid::new_v4(), "alice", long_ago).unwrap();

        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = issuer("one_secret").issue(Uuid::new_v4(), "alice").unwrap();

        match issuer("a_completely_different_secret").verify(&token) {
            Err(TokenError::Invalid(msg)) => assert!(msg.contains("InvalidSignature")),
            other => panic!("Token should have been invalid due to signature mismatch: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_token() {
        let issuer = issuer("test_secret");
        assert!(matches!(issuer.verify("not-a-jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(issuer.verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_remaining_lifetime() {
        let issuer = issuer("test_secret");
        let token = issuer.issue(Uuid::new_v4(), "alice").unwrap();
        let claims = issuer.verify(&token).unwrap();

        let remaining = issuer.remaining_lifetime(&claims);
        assert!(remaining <= FIVE_MINUTES);
        assert!(remaining >= Duration::from_secs(298));

        let stale = Claims {
            exp: Utc::now().timestamp() - 10,
            ..claims
        };
        assert_eq!(issuer.remaining_lifetime(&stale), Duration::from_secs(1));
    }
}
