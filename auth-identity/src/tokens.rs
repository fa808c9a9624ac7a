//! Bearer token issuing and verification (HS256 JWT)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::models::{Role, User};

/// JWT token claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Role at the time of issue; authorization re-reads the stored user
    pub role: Role,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &IdentityConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            ttl: Duration::hours(config.jwt_expiration_hours),
        }
    }

    /// Issue a token for `user`
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] if encoding fails.
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature, expiry and issuer
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] for any rejected token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }
}
