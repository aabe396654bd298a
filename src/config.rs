//! Server configuration, read once at start-up from flags or environment variables

use axum::http::HeaderValue;
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::PasswordHasher;
use crate::repository::{ClinicRepository, InMemoryClinicRepository, PostgresClinicRepository};
use crate::session::repository::{
    InMemorySessionRepository, PostgresSessionRepository, SessionRepository,
};
use crate::session::service::SessionService;
use crate::session::token::TokenConfig;
use crate::shared::{AppError, AppState};

const DEV_SESSION_SECRET: &str = "clinic-development-secret";

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "CLINIC_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Postgres connection string; in-memory storage is used when absent
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Secret used to sign session tokens
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Lifetime of a login session
    #[arg(long, env = "SESSION_TTL_HOURS", default_value_t = 168)]
    pub session_ttl_hours: i64,

    /// Interval between expired-session sweeps
    #[arg(long, env = "SESSION_CLEANUP_MINUTES", default_value_t = 30)]
    pub session_cleanup_minutes: u64,

    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Mark the session cookie `Secure` (serve over HTTPS)
    #[arg(long, env = "SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Allowed browser origin for cross-origin requests
    #[arg(long, env = "CORS_ORIGIN")]
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    pub fn token_config(&self) -> TokenConfig {
        let secret = match &self.session_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("SESSION_SECRET not set, using the development secret");
                DEV_SESSION_SECRET.to_string()
            }
        };
        TokenConfig::new(secret, self.session_ttl_hours)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.session_cleanup_minutes.max(1) * 60)
    }

    pub fn cors_origin(&self) -> Result<Option<HeaderValue>, AppError> {
        self.cors_origin
            .as_deref()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .map_err(|e| AppError::Validation(format!("invalid CORS origin: {}", e)))
            })
            .transpose()
    }

    /// Wires repositories and services. Postgres is migrated on connect.
    pub async fn build_state(&self) -> Result<AppState, AppError> {
        if self.session_ttl_hours <= 0 {
            return Err(AppError::Validation(
                "session TTL must be positive".to_string(),
            ));
        }

        let (repository, session_repository): (
            Arc<dyn ClinicRepository + Send + Sync>,
            Arc<dyn SessionRepository + Send + Sync>,
        ) = match &self.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .map_err(|e| AppError::DatabaseError(format!("failed to connect: {}", e)))?;
                let repository = PostgresClinicRepository::new(pool.clone());
                repository.migrate().await?;
                info!("Connected to Postgres");

                (
                    Arc::new(repository),
                    Arc::new(PostgresSessionRepository::new(pool)),
                )
            }
            None => {
                warn!("DATABASE_URL not set, data is kept in memory and lost on exit");
                (
                    Arc::new(InMemoryClinicRepository::new()),
                    Arc::new(InMemorySessionRepository::new()),
                )
            }
        };

        let session_service = SessionService::new(session_repository, self.token_config())
            .with_secure_cookies(self.secure_cookies);

        Ok(AppState::new(
            repository,
            Arc::new(session_service),
            PasswordHasher::new(self.bcrypt_cost),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["clinic"]).unwrap();
        let config = cli.config;

        assert_eq!(config.bind.port(), 3000);
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(30 * 60));
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::try_parse_from([
            "clinic",
            "--bind",
            "127.0.0.1:8080",
            "--session-ttl-hours",
            "12",
            "--bcrypt-cost",
            "4",
            "--cors-origin",
            "http://localhost:5173",
            "--secure-cookies",
        ])
        .unwrap();
        let config = cli.config;

        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(config.token_config().ttl(), chrono::Duration::hours(12));
        assert_eq!(
            config.cors_origin().unwrap(),
            Some(HeaderValue::from_static("http://localhost:5173"))
        );
        assert!(config.secure_cookies);
    }

    #[tokio::test]
    async fn test_in_memory_state_without_database() {
        let mut config = TestCli::try_parse_from(["clinic", "--bcrypt-cost", "4"])
            .unwrap()
            .config;
        config.database_url = None;

        let state = config.build_state().await.unwrap();
        assert!(state.repository.list_users(None).await.unwrap().is_empty());
    }
}
