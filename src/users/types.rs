use serde::Deserialize;

use super::models::Role;

/// Request payload for creating a user (admin endpoint and registration)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
}
