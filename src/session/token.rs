use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::SessionClaims;
use crate::shared::AppError;

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub ttl_hours: i64,
}

impl TokenConfig {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        Self { secret, ttl_hours }
    }

    pub fn ttl(&self) -> Duration {
        Duration::hours(self.ttl_hours)
    }

    /// Creates a signed token carrying only the session id
    #[instrument(skip(self, session_id))]
    pub fn create_token(&self, session_id: String) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + self.ttl()).timestamp() as usize;

        debug!(
            ttl_hours = self.ttl_hours,
            exp_timestamp = exp,
            "Creating session token with expiration"
        );

        let claims = SessionClaims {
            session_id,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Validates a token's signature and expiry and returns its claims
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode session token");
            AppError::Unauthenticated("Invalid session token".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_validate_token() {
        let config = TokenConfig::new("secret".to_string(), 24);

        let token = config.create_token("test-session-id".to_string()).unwrap();
        assert!(!token.is_empty());

        let claims = config.validate_token(&token).unwrap();
        assert_eq!(claims.session_id, "test-session-id");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token() {
        let config = TokenConfig::new("secret".to_string(), 24);
        let result = config.validate_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn test_token_with_different_secret() {
        let config1 = TokenConfig::new("secret-one".to_string(), 24);
        let config2 = TokenConfig::new("secret-two".to_string(), 24);

        let token = config1.create_token("session".to_string()).unwrap();

        assert!(config1.validate_token(&token).is_ok());
        assert!(matches!(
            config2.validate_token(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = TokenConfig::new("secret".to_string(), -2);
        let token = config.create_token("session".to_string()).unwrap();

        assert!(matches!(
            config.validate_token(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }
}
