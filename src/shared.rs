use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::PasswordHasher;
use crate::repository::ClinicRepository;
use crate::session::service::SessionService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ClinicRepository + Send + Sync>,
    pub session_service: Arc<SessionService>,
    pub password_hasher: PasswordHasher,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn ClinicRepository + Send + Sync>,
        session_service: Arc<SessionService>,
        password_hasher: PasswordHasher,
    ) -> Self {
        Self {
            repository,
            session_service,
            password_hasher,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_authenticated() -> Self {
        AppError::Unauthenticated("Not authenticated".to_string())
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Forbidden".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                // Details stay in the log, never in the response body
                error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the `{message}` error shape
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

/// Renders a panicking handler as a generic 500
pub fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::Internal("handler panicked".to_string()).into_response()
}

/// Rejects blank strings, returning the trimmed value
pub fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional field, treating blank input as absent
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Money columns are `NUMERIC(10, 2)`: below 10^8 with at most two decimal places
pub fn validate_money(field: &str, value: Decimal) -> Result<Decimal, AppError> {
    check_decimal_places(field, value, 2)?;
    if value.abs() >= Decimal::from(100_000_000) {
        return Err(AppError::Validation(format!(
            "{} must be less than 100000000",
            field
        )));
    }
    Ok(value)
}

/// Rejects values the column would silently round
pub fn check_decimal_places(field: &str, value: Decimal, places: u32) -> Result<(), AppError> {
    if value.normalize().scale() > places {
        return Err(AppError::Validation(format!(
            "{} can have at most {} decimal places",
            field, places
        )));
    }
    Ok(())
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::auth::MIN_BCRYPT_COST;
    use crate::repository::InMemoryClinicRepository;
    use crate::session::repository::InMemorySessionRepository;
    use crate::session::token::TokenConfig;

    /// Builder for an in-memory AppState for testing
    pub struct AppStateBuilder;

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self
        }

        pub fn build(self) -> AppState {
            let session_service = SessionService::new(
                Arc::new(InMemorySessionRepository::new()),
                TokenConfig::new("test-secret".to_string(), 24),
            );

            AppState {
                repository: Arc::new(InMemoryClinicRepository::new()),
                session_service: Arc::new(session_service),
                password_hasher: PasswordHasher::new(MIN_BCRYPT_COST),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
