use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::SessionModel, repository::SessionRepository, token::TokenConfig,
    types::IssuedSession,
};
use crate::shared::AppError;

/// Service for handling session business logic
pub struct SessionService {
    token_config: TokenConfig,
    repository: Arc<dyn SessionRepository + Send + Sync>,
    secure_cookies: bool,
}

impl SessionService {
    pub fn new(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            token_config,
            repository,
            secure_cookies: false,
        }
    }

    /// Marks issued cookies `Secure`
    pub fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Stores a new session for the user and signs a token for it
    #[instrument(skip(self))]
    pub async fn create_session(&self, user_id: &str) -> Result<IssuedSession, AppError> {
        let session = SessionModel::new(user_id.to_string(), self.token_config.ttl());
        self.repository.create_session(&session).await?;

        let token = self.token_config.create_token(session.id.clone())?;
        info!(session_id = %session.id, "Session created");

        Ok(IssuedSession {
            session_id: session.id,
            token,
            max_age_secs: self.token_config.ttl().num_seconds(),
        })
    }

    /// Resolves a token to its live session.
    /// Expired sessions are removed on sight.
    #[instrument(skip(self, token))]
    pub async fn validate_session(&self, token: &str) -> Result<SessionModel, AppError> {
        let claims = self.token_config.validate_token(token)?;

        match self.repository.get_session(&claims.session_id).await? {
            Some(session) if session.is_expired() => {
                warn!(session_id = %claims.session_id, "Session has expired");
                if let Err(e) = self.repository.delete_session(&session.id).await {
                    warn!(error = %e, "Failed to remove expired session");
                }
                Err(AppError::Unauthenticated("Session has expired".to_string()))
            }
            Some(mut session) => {
                if let Err(e) = self.repository.touch_session(&session.id).await {
                    warn!(error = %e, "Failed to record session access");
                }
                session.last_accessed = Some(Utc::now());
                Ok(session)
            }
            None => {
                warn!(
                    session_id = %claims.session_id,
                    "Session not found - may have been revoked"
                );
                Err(AppError::Unauthenticated(
                    "Session not found or has been revoked".to_string(),
                ))
            }
        }
    }

    /// Revokes a session. Revoking an already-removed session is not an error.
    #[instrument(skip(self))]
    pub async fn revoke_session(&self, session_id: &str) -> Result<(), AppError> {
        match self.repository.delete_session(session_id).await {
            Ok(()) | Err(AppError::NotFound(_)) => {
                info!(session_id = %session_id, "Session revoked");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Revokes every session belonging to a user
    #[instrument(skip(self))]
    pub async fn revoke_user_sessions(&self, user_id: &str) -> Result<u64, AppError> {
        let removed = self.repository.delete_user_sessions(user_id).await?;
        info!(user_id = %user_id, removed_sessions = removed, "User sessions revoked");
        Ok(removed)
    }

    /// Cleans up expired sessions from the store
    #[instrument(skip(self))]
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let removed_count = self.repository.cleanup_expired_sessions().await?;

        info!(
            removed_sessions = removed_count,
            "Expired sessions cleanup completed"
        );
        Ok(removed_count)
    }
}
