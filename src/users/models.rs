use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::shared::AppError;

/// Role of a clinic account, stored as the `user_role` Postgres enum
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Accountant,
}

/// Database model for the users table.
///
/// Deliberately not `Serialize`: the password hash can only leave the
/// process through `UserResponse`, which drops it.
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user model with generated ID and creation timestamp
    pub fn new(
        email: String,
        password_hash: String,
        name: String,
        role: Role,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            name,
            role,
            phone,
            avatar: None,
            created_at: Utc::now(),
        }
    }
}

/// Public view of a user, returned by every user-facing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            phone: user.phone,
            avatar: user.avatar,
            created_at: user.created_at,
        }
    }
}

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Trims and lower-cases an email address, rejecting obviously malformed ones.
/// Uniqueness and login lookups always go through this.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  A@X.com ").unwrap(), "a@x.com");
    }

    #[test]
    fn test_normalize_email_rejects_malformed() {
        for raw in ["", "no-at-sign", "@x.com", "a@", "a@b@c", "a b@x.com"] {
            assert!(
                matches!(normalize_email(raw), Err(AppError::Validation(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("secret1").is_ok());
        assert!(matches!(
            validate_password("abc"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_user_response_has_no_password() {
        let user = UserModel::new(
            "a@x.com".to_string(),
            "$2b$04$hash".to_string(),
            "A".to_string(),
            Role::Patient,
            None,
        );
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("$2b$04$hash"));
        assert_eq!(json["role"], "patient");
    }

    #[test]
    fn test_role_string_forms() {
        assert_eq!(Role::Accountant.to_string(), "accountant");
        assert_eq!(Role::from_str("doctor").unwrap(), Role::Doctor);
        assert!(Role::from_str("nurse").is_err());
    }
}
