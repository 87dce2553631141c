use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::common::IdentityId;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: IdentityId, // Subject (identity id)
    pub email: String,   // Normalized e-mail
    pub exp: i64,        // Expiration timestamp
    pub iat: i64,        // Issued at timestamp
    pub iss: String,     // Issuer
    pub jti: String,     // JWT ID (unique token identifier)
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(err),
        }
    }
}

/// JWT Service - issues and verifies session tokens
///
/// The key is fixed for the lifetime of the service; build one at startup and
/// share it behind an `Arc`.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    /// Create new JWT service with secret, issuer and token lifetime
    pub fn new(secret: &[u8], issuer: String, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
            ttl,
        }
    }

    /// Service with a random 256-bit key.
    ///
    /// Tokens stop verifying when the process restarts. Development only.
    pub fn with_random_secret(issuer: String, ttl: Duration) -> Self {
        warn!("JWT_SECRET not configured; generated a per-process signing key, sessions will not survive a restart");
        let mut secret = [0u8; 32];
        rand::rng().fill(&mut secret);
        Self::new(&secret, issuer, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session token for an identity, valid for `ttl` from `issued_at`.
    pub fn create_token(
        &self,
        identity_id: IdentityId,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let exp = issued_at + self.ttl;

        let claims = Claims {
            sub: identity_id,
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: issued_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(), // Unique token ID
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if the signature, issuer and expiry all check out
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        // `sub` is numeric; jsonwebtoken only recognises string subjects, so
        // its presence is enforced by deserializing `Claims` instead.
        validation.set_required_spec_claims(&["exp", "iss"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}
