//! JWT token handling
//!
//! Tokens are stateless: signature and expiry are their only state, so
//! nothing is stored and nothing can be revoked before `exp`.

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};

use super::models::Claims;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token invalid")]
    Invalid,

    #[error("token expired")]
    Expired,

    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Issues and verifies HS256 tokens with one server-held secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `claims` with `iat` = now and `exp` = now + `ttl`.
    pub fn issue(&self, mut claims: Claims, ttl: chrono::Duration) -> Result<String, TokenError> {
        let now = chrono::Utc::now();
        claims.iat = now.timestamp();
        claims.exp = (now + ttl).timestamp();

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Check signature and expiry, returning the embedded claims unchanged.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
