//! Identity token issuance and verification

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{DecodingKey, EncodingKey};
use mockable::Clock;

use crate::{
    config::{AuthConfig, MAX_TOKEN_LIFETIME_HOURS},
    error::{AppError, AppResult},
    models::{User, UserClaims},
};

/// Signs and verifies bearer tokens with the process-wide secret.
///
/// The authenticator and the access guard share one instance so they always
/// agree on the key and the clock.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
            clock,
        }
    }

    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let hours = config.jwt_expiration_hours.min(MAX_TOKEN_LIFETIME_HOURS) as i64;
        Self::new(&config.jwt_secret, Duration::hours(hours), clock)
    }

    /// Token lifetime in seconds
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Issue a token for `user`, expiring one lifetime from now
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = self.clock.utc().timestamp();

        let claims = UserClaims {
            sub: user.id.to_string(),
            user_id: user.id,
            role: user.role,
            exp: now + self.lifetime_secs(),
            iat: now,
        };

        claims
            .create_token(&self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Verify signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.decoding).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized("invalid or expired token".to_string())
        })?;

        if claims.exp <= self.clock.utc().timestamp() {
            tracing::debug!(user_id = claims.user_id, "rejected expired bearer token");
            return Err(AppError::Unauthorized("invalid or expired token".to_string()));
        }

        Ok(claims)
    }
}
