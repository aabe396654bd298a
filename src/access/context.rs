use crate::shared::AppError;
use crate::users::models::{Role, UserModel};

/// The acting user, resolved from the session once per request
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&UserModel> for AuthenticatedUser {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// Per-request context inserted by the session middleware.
/// Handlers extract it with `Extension(ctx): Extension<RequestContext>`.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<AuthenticatedUser>,
    pub session_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: AuthenticatedUser, session_id: String) -> Self {
        Self {
            user: Some(user),
            session_id: Some(session_id),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.user.as_ref().ok_or_else(AppError::not_authenticated)
    }
}
