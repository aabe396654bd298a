use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::UserResponse,
    service::UserService,
    types::{CreateUserRequest, UpdateUserRequest, UserListQuery},
};
use crate::access::{authorize, context::RequestContext, Action, Resource};
use crate::shared::{AppError, AppState, ValidJson, ValidQuery};

fn user_service(state: &AppState) -> UserService {
    UserService::new(Arc::clone(&state.repository), state.password_hasher.clone())
}

/// GET /api/users[?role=doctor]
#[instrument(name = "list_users", skip(state, ctx))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidQuery(query): ValidQuery<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    authorize(&ctx, Resource::Users, Action::List)?;

    let users = user_service(&state).list_users(query.role).await?;
    info!(user_count = users.len(), "Users listed");

    Ok(Json(users))
}

/// GET /api/users/:id
#[instrument(name = "get_user", skip(state, ctx))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let access = authorize(&ctx, Resource::Users, Action::Read)?;
    let user = user_service(&state).get_user(&access, &user_id).await?;
    Ok(Json(user))
}

/// POST /api/users
#[instrument(name = "create_user", skip(state, ctx, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    authorize(&ctx, Resource::Users, Action::Create)?;

    let user = user_service(&state).create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /api/users/:id
#[instrument(name = "update_user", skip(state, ctx, request))]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
    ValidJson(request): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let access = authorize(&ctx, Resource::Users, Action::Update)?;
    let user = user_service(&state)
        .update_user(&access, &user_id, request)
        .await?;
    Ok(Json(user))
}

/// DELETE /api/users/:id
///
/// Cascades to the user's doctor profile and appointments, and signs the user out everywhere
#[instrument(name = "delete_user", skip(state, ctx))]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    authorize(&ctx, Resource::Users, Action::Delete)?;

    user_service(&state).delete_user(&user_id).await?;
    state.session_service.revoke_user_sessions(&user_id).await?;

    Ok(Json(json!({ "message": "User deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::context::AuthenticatedUser;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::users::models::{Role, UserModel};
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt; // for `oneshot`

    fn router(state: AppState, ctx: RequestContext) -> Router {
        Router::new()
            .route("/users", get(list_users).post(create_user))
            .route("/users/:id", get(get_user).delete(delete_user))
            .layer(Extension(ctx))
            .with_state(state)
    }

    fn context(user: &UserModel) -> RequestContext {
        RequestContext::authenticated(AuthenticatedUser::from(user), "session".to_string())
    }

    async fn stored_user(state: &AppState, email: &str, role: Role) -> UserModel {
        let user = UserModel::new(
            email.to_string(),
            "hash".to_string(),
            email.to_string(),
            role,
            None,
        );
        state.repository.create_user(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_list_users_filters_by_role() {
        let state = AppStateBuilder::new().build();
        let admin = stored_user(&state, "admin@x.com", Role::Admin).await;
        stored_user(&state, "doc@x.com", Role::Doctor).await;

        let request = Request::builder()
            .uri("/users?role=doctor")
            .body(Body::empty())
            .unwrap();
        let response = router(state, context(&admin)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let users: Vec<UserResponse> = serde_json::from_slice(&body).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Doctor);
    }

    #[tokio::test]
    async fn test_list_users_rejects_unknown_role() {
        let state = AppStateBuilder::new().build();
        let admin = stored_user(&state, "admin@x.com", Role::Admin).await;

        let request = Request::builder()
            .uri("/users?role=nurse")
            .body(Body::empty())
            .unwrap();
        let response = router(state, context(&admin)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patient_cannot_list_users() {
        let state = AppStateBuilder::new().build();
        let patient = stored_user(&state, "p@x.com", Role::Patient).await;

        let request = Request::builder().uri("/users").body(Body::empty()).unwrap();
        let response = router(state, context(&patient))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_user_revokes_sessions() {
        let state = AppStateBuilder::new().build();
        let admin = stored_user(&state, "admin@x.com", Role::Admin).await;
        let patient = stored_user(&state, "p@x.com", Role::Patient).await;
        let issued = state.session_service.create_session(&patient.id).await.unwrap();

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/users/{}", patient.id))
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone(), context(&admin))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(state
            .session_service
            .validate_session(&issued.token)
            .await
            .is_err());
    }
}
