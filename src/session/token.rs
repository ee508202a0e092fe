use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, instrument};

use super::types::SessionClaims;
use crate::shared::AppError;

/// How a token failed verification. The split exists for logging precision
/// only; callers collapse both kinds into one opaque denial so the response
/// never reveals which check failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a well-formed JWT")]
    Malformed,

    #[error("token is expired or its signature does not verify")]
    ExpiredOrBadSignature,
}

/// Configuration for JWT token operations
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    ttl_hours: i64,
}

impl TokenConfig {
    pub fn new() -> Self {
        // Allow configuring expiration via env var, default to 24 hours
        let ttl_hours = std::env::var("TOKEN_EXPIRATION_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24);

        Self {
            secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
            ttl_hours,
        }
    }

    /// Overrides the token lifetime, e.g. for embedders that want short-lived
    /// sessions.
    pub fn with_ttl_hours(mut self, ttl_hours: i64) -> Self {
        self.ttl_hours = ttl_hours;
        self
    }

    /// Issues a signed token bound to the given user id
    #[instrument(skip(self, user_id))]
    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(self.ttl_hours)).timestamp() as usize,
        };

        debug!(ttl_hours = self.ttl_hours, exp = claims.exp, "Issuing session token");

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode session token");
            AppError::Infrastructure(format!("token signing failed: {e}"))
        })
    }

    /// Checks signature integrity and expiry, returning the embedded claims
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::InvalidSignature => {
                    TokenError::ExpiredOrBadSignature
                }
                _ => TokenError::Malformed,
            };
            debug!(error = %e, kind = ?kind, "Token failed verification");
            kind
        })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new()
    }
}
