use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::types::{LoginRequest, MessageResponse};
use crate::access::context::RequestContext;
use crate::session::{clear_session_cookie, session_cookie};
use crate::shared::{AppError, AppState, ValidJson};
use crate::users::{
    models::{Role, UserResponse},
    types::CreateUserRequest,
    UserService,
};

fn user_service(state: &AppState) -> UserService {
    UserService::new(Arc::clone(&state.repository), state.password_hasher.clone())
}

/// HTTP handler for account registration
///
/// POST /api/auth/register
/// Anyone may register as a patient; other roles need an admin session.
#[instrument(name = "register", skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidJson(request): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let role = request.role.unwrap_or(Role::Patient);
    if role != Role::Patient && !ctx.is_admin() {
        warn!(requested_role = %role, "Privileged registration without admin session");
        return Err(AppError::forbidden());
    }

    let user = user_service(&state).create_user(request).await?;
    info!(user_id = %user.id, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// HTTP handler for login
///
/// POST /api/auth/login
/// Returns the user and sets the session cookie. The token is also accepted
/// as a Bearer header.
#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_service(&state)
        .authenticate(&request.email, &request.password)
        .await?;

    let issued = state.session_service.create_session(&user.id).await?;
    let cookie = session_cookie(
        &issued.token,
        issued.max_age_secs,
        state.session_service.secure_cookies(),
    );
    info!(user_id = %user.id, session_id = %issued.session_id, "User logged in");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse::from(user)),
    ))
}

/// HTTP handler for logout
///
/// POST /api/auth/logout
/// Destroys the current session (if any) and clears the cookie.
#[instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session_id) = &ctx.session_id {
        state.session_service.revoke_session(session_id).await?;
    }

    let cookie = clear_session_cookie(state.session_service.secure_cookies());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(MessageResponse::new("Logged out")),
    ))
}

/// HTTP handler for the current user
///
/// GET /api/auth/me
#[instrument(name = "me", skip_all)]
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<UserResponse>, AppError> {
    let current = ctx.require_user()?;
    let user = user_service(&state).find_user(&current.id).await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::context::AuthenticatedUser;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::users::models::UserModel;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request},
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn router(state: AppState, ctx: RequestContext) -> Router {
        Router::new()
            .route("/register", post(register))
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/me", get(me))
            .layer(Extension(ctx))
            .with_state(state)
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_patient() {
        let state = AppStateBuilder::new().build();
        let request = json_request(
            "/register",
            r#"{"email": "a@x.com", "password": "secret1", "name": "A", "role": "patient"}"#,
        );

        let response = router(state, RequestContext::anonymous())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret1"));
        assert!(!text.contains("password"));
    }

    #[tokio::test]
    async fn test_anonymous_cannot_register_admin() {
        let state = AppStateBuilder::new().build();
        let request = json_request(
            "/register",
            r#"{"email": "a@x.com", "password": "secret1", "name": "A", "role": "admin"}"#,
        );

        let response = router(state, RequestContext::anonymous())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_register_missing_field_is_bad_request() {
        let state = AppStateBuilder::new().build();
        let request = json_request("/register", r#"{"email": "a@x.com"}"#);

        let response = router(state, RequestContext::anonymous())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value["message"].is_string());
    }

    #[tokio::test]
    async fn test_login_sets_cookie() {
        let state = AppStateBuilder::new().build();
        let hash = state.password_hasher.hash("secret1").await.unwrap();
        let user = UserModel::new(
            "a@x.com".to_string(),
            hash,
            "A".to_string(),
            Role::Patient,
            None,
        );
        state.repository.create_user(&user).await.unwrap();

        let request = json_request("/login", r#"{"email": "A@x.com", "password": "secret1"}"#);
        let response = router(state, RequestContext::anonymous())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("clinic_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let state = AppStateBuilder::new().build();
        let hash = state.password_hasher.hash("secret1").await.unwrap();
        let user = UserModel::new(
            "a@x.com".to_string(),
            hash,
            "A".to_string(),
            Role::Patient,
            None,
        );
        state.repository.create_user(&user).await.unwrap();

        let request = json_request("/login", r#"{"email": "a@x.com", "password": "nope123"}"#);
        let response = router(state, RequestContext::anonymous())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let message: MessageResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(message, MessageResponse::new("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let state = AppStateBuilder::new().build();
        let request = Request::builder().uri("/me").body(Body::empty()).unwrap();

        let response = router(state, RequestContext::anonymous())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let state = AppStateBuilder::new().build();
        let user = UserModel::new(
            "a@x.com".to_string(),
            "hash".to_string(),
            "A".to_string(),
            Role::Patient,
            None,
        );
        state.repository.create_user(&user).await.unwrap();
        let issued = state.session_service.create_session(&user.id).await.unwrap();
        let ctx = RequestContext::authenticated(
            AuthenticatedUser::from(&user),
            issued.session_id.clone(),
        );

        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone(), ctx).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert!(state
            .session_service
            .validate_session(&issued.token)
            .await
            .is_err());
    }
}
