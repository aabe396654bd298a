// Public API - what other modules can use
pub use cleanup_task::start_cleanup_task;
pub use middleware::{clear_session_cookie, session_context, session_cookie, SESSION_COOKIE};
pub use types::{IssuedSession, SessionClaims};

// Internal modules
mod cleanup_task;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;
mod types;
