//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs. Access and refresh tokens share a signing key but
//! carry a `typ` claim, and each verifier only accepts its own kind.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use bazaar_core::UserId;

use crate::config::JwtConfig;

/// Which of the pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: UserId,
    pub username: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
    pub typ: TokenKind,
}

/// Errors from issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, expiry, or encoding failure.
    #[error("invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// A refresh token was presented where an access token was expected, or
    /// the other way round.
    #[error("wrong token type: expected {expected:?}")]
    WrongKind { expected: TokenKind },
}

/// An access + refresh token pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies signed tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl TokenService {
    /// Create a token service from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue a fresh access + refresh pair.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Jwt` if encoding fails.
    pub fn issue_pair(&self, user_id: UserId, username: &str) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user_id, username, TokenKind::Access)?,
            refresh: self.issue(user_id, username, TokenKind::Refresh)?,
        })
    }

    /// Issue a single token of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Jwt` if encoding fails.
    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        kind: TokenKind,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            username: username.to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
            typ: kind,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token's signature and expiry and check its kind.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Jwt` for a bad signature, malformed token, or
    /// expired token, and `TokenError::WrongKind` for the other token kind.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        if data.claims.typ != expected {
            return Err(TokenError::WrongKind { expected });
        }
        Ok(data.claims)
    }
}
