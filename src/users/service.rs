use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{normalize_email, validate_password, Role, UserModel, UserResponse},
    types::{CreateUserRequest, UpdateUserRequest},
};
use crate::access::Access;
use crate::auth::PasswordHasher;
use crate::repository::{AppointmentFilter, ClinicRepository};
use crate::shared::{optional_text, require_text, AppError};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Service for user accounts and credentials
pub struct UserService {
    repository: Arc<dyn ClinicRepository + Send + Sync>,
    password_hasher: PasswordHasher,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn ClinicRepository + Send + Sync>,
        password_hasher: PasswordHasher,
    ) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserResponse>, AppError> {
        let users = self.repository.list_users(role).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    #[instrument(skip(self, access))]
    pub async fn get_user(&self, access: &Access, user_id: &str) -> Result<UserResponse, AppError> {
        access.ensure_owner(user_id)?;
        self.find_user(user_id).await.map(UserResponse::from)
    }

    /// Validates and stores a new account. Role defaults to patient.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserResponse, AppError> {
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;
        let name = require_text("name", &request.name)?;
        let role = request.role.unwrap_or(Role::Patient);

        let password_hash = self.password_hasher.hash(&request.password).await?;
        let mut user = UserModel::new(
            email,
            password_hash,
            name,
            role,
            optional_text(request.phone),
        );
        user.avatar = optional_text(request.avatar);

        self.repository.create_user(&user).await?;
        info!(user_id = %user.id, role = %user.role, "User created");

        Ok(user.into())
    }

    /// Applies a partial update. Owners may edit their own profile fields;
    /// role changes need an admin.
    #[instrument(skip(self, access, request))]
    pub async fn update_user(
        &self,
        access: &Access,
        user_id: &str,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AppError> {
        access.ensure_owner(user_id)?;
        let mut user = self.find_user(user_id).await?;

        if let Some(role) = request.role.filter(|role| *role != user.role) {
            if !access.is_admin() {
                warn!(user_id = %user_id, "Non-admin attempted a role change");
                return Err(AppError::forbidden());
            }
            if user.role == Role::Doctor
                && self
                    .repository
                    .get_doctor_profile_by_user(user_id)
                    .await?
                    .is_some()
            {
                return Err(AppError::Conflict(
                    "Remove the doctor profile before changing this user's role".to_string(),
                ));
            }
            if self.has_appointments_as(&user).await? {
                return Err(AppError::Conflict(format!(
                    "User has appointments as a {} and cannot change role",
                    user.role
                )));
            }
            user.role = role;
        }

        if let Some(email) = request.email {
            user.email = normalize_email(&email)?;
        }
        if let Some(password) = request.password {
            validate_password(&password)?;
            user.password_hash = self.password_hasher.hash(&password).await?;
            debug!(user_id = %user_id, "Password re-hashed");
        }
        if let Some(name) = request.name {
            user.name = require_text("name", &name)?;
        }
        if request.phone.is_some() {
            user.phone = optional_text(request.phone);
        }
        if request.avatar.is_some() {
            user.avatar = optional_text(request.avatar);
        }

        self.repository.update_user(&user).await?;
        info!(user_id = %user.id, "User updated");

        Ok(user.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        self.repository.delete_user(user_id).await?;
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Checks an email/password pair. Every failure looks the same to the caller.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserModel, AppError> {
        let invalid = || AppError::Unauthenticated(INVALID_CREDENTIALS.to_string());

        let email = normalize_email(email).map_err(|_| invalid())?;
        let user = match self.repository.get_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                debug!("Login for unknown email");
                return Err(invalid());
            }
        };

        if !self
            .password_hasher
            .verify(password, &user.password_hash)
            .await?
        {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid());
        }

        Ok(user)
    }

    /// Whether the user is a party to any appointment in their current role
    async fn has_appointments_as(&self, user: &UserModel) -> Result<bool, AppError> {
        let filter = match user.role {
            Role::Doctor => AppointmentFilter::for_doctor(&user.id),
            Role::Patient => AppointmentFilter::for_patient(&user.id),
            Role::Admin | Role::Accountant => return Ok(false),
        };
        Ok(!self.repository.list_appointments(&filter).await?.is_empty())
    }

    pub async fn find_user(&self, user_id: &str) -> Result<UserModel, AppError> {
        self.repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
