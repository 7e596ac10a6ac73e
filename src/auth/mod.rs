pub mod cookies;
pub mod session;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use cookies::CookieSettings;
pub use session::{IssuedSession, JwtSessionProvider, SessionOutcome, SessionProvider};

/// Access tokens authenticate requests; refresh tokens only mint new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, kind: TokenKind, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            sub,
            kind,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    InvalidSecret,
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("Expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
}

/// HS256 signing and verification keys, derived once from the shared secret
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature and expiry, then insist on the expected token kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.kind != expected {
            return Err(AuthError::WrongKind { expected });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(JwtKeys::from_secret(""), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn signed_token_verifies_with_same_kind() {
        let keys = JwtKeys::from_secret("test-secret").unwrap();
        let id = Uuid::new_v4();
        let token = keys
            .sign(&Claims::new(id, TokenKind::Access, Utc::now(), Duration::minutes(5)))
            .unwrap();

        assert_eq!(keys.verify(&token, TokenKind::Access).unwrap().sub, id);
        assert!(matches!(
            keys.verify(&token, TokenKind::Refresh),
            Err(AuthError::WrongKind { expected: TokenKind::Refresh })
        ));
    }

    #[test]
    fn expired_and_foreign_tokens_fail() {
        let keys = JwtKeys::from_secret("test-secret").unwrap();
        let other = JwtKeys::from_secret("other-secret").unwrap();
        let id = Uuid::new_v4();

        let expired = keys
            .sign(&Claims::new(id, TokenKind::Access, Utc::now() - Duration::hours(2), Duration::hours(1)))
            .unwrap();
        assert!(matches!(keys.verify(&expired, TokenKind::Access), Err(AuthError::InvalidToken(_))));

        let foreign = other
            .sign(&Claims::new(id, TokenKind::Access, Utc::now(), Duration::minutes(5)))
            .unwrap();
        assert!(keys.verify(&foreign, TokenKind::Access).is_err());
    }
}
