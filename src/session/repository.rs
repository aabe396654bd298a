use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::shared::AppError;

/// Trait for session repository operations
#[async_trait]
pub trait SessionRepository {
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError>;
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError>;
    async fn touch_session(&self, session_id: &str) -> Result<(), AppError>;
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;
    async fn delete_user_sessions(&self, user_id: &str) -> Result<u64, AppError>;
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError>;
}

/// In-memory implementation of SessionRepository for development and testing.
/// Sessions are keyed by id, so concurrent requests never see each other's entries.
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, SessionModel>>,
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated sessions
    pub fn with_sessions(sessions: Vec<SessionModel>) -> Self {
        let session_map = sessions
            .into_iter()
            .map(|session| (session.id.clone(), session))
            .collect();

        Self {
            sessions: RwLock::new(session_map),
        }
    }

    /// Returns the current number of sessions in the repository
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            warn!("Session already exists in memory");
            return Err(AppError::DatabaseError(
                "Session already exists".to_string(),
            ));
        }
        sessions.insert(session.id.clone(), session.clone());

        debug!(user_id = %session.user_id, "Session created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        let session = self.sessions.read().await.get(session_id).cloned();

        match &session {
            Some(s) => debug!(user_id = %s.user_id, "Session found in memory"),
            None => debug!("Session not found in memory"),
        }

        Ok(session)
    }

    #[instrument(skip(self))]
    async fn touch_session(&self, session_id: &str) -> Result<(), AppError> {
        match self.sessions.write().await.get_mut(session_id) {
            Some(session) => {
                session.last_accessed = Some(Utc::now());
                Ok(())
            }
            None => Err(AppError::NotFound("Session not found".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(session_id).is_none() {
            warn!("Session not found for deletion in memory");
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        debug!("Session deleted successfully from memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user_sessions(&self, user_id: &str) -> Result<u64, AppError> {
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();
        sessions.retain(|_, session| session.user_id != user_id);

        Ok((initial_count - sessions.len()) as u64)
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let initial_count = sessions.len();

        sessions.retain(|_, session| session.expires_at > now);

        let removed_count = initial_count - sessions.len();
        debug!(
            expired_sessions_removed = removed_count,
            "Expired sessions cleaned up from memory"
        );
        Ok(removed_count as u64)
    }
}

/// PostgreSQL implementation of session repository
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn create_session(&self, session: &SessionModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, created_at, expires_at, last_accessed) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_accessed)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create session in database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!("Session created successfully in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        sqlx::query_as::<_, SessionModel>(
            "SELECT id, user_id, created_at, expires_at, last_accessed \
             FROM user_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch session from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn touch_session(&self, session_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE user_sessions SET last_accessed = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to touch session");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Session not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete session from database");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!("Session not found for deletion");
            return Err(AppError::NotFound("Session not found".to_string()));
        }

        debug!("Session deleted successfully from database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user_sessions(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete user sessions");
                AppError::DatabaseError(e.to_string())
            })?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn cleanup_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to cleanup expired sessions");
                AppError::DatabaseError(e.to_string())
            })?;

        let rows_affected = result.rows_affected();
        debug!(
            expired_sessions_removed = rows_affected,
            "Expired sessions cleaned up"
        );
        Ok(rows_affected)
    }
}
