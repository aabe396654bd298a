// Public API - what other modules can use
pub use handlers::{login, logout, me, register};
pub use password::{PasswordHasher, MIN_BCRYPT_COST};

mod handlers;
mod password;
pub mod types;
