use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::access::context::{AuthenticatedUser, RequestContext};
use crate::shared::{AppError, AppState};

pub const SESSION_COOKIE: &str = "clinic_session";

/// Finds the session token in the Authorization Bearer header or the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Session middleware - resolves the session token (if any) into a `RequestContext`
/// and adds it to the request. Missing, invalid, and expired tokens yield an
/// anonymous context; the guard decides whether that is enough.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::session_context))
#[instrument(skip_all, fields(method = %req.method(), uri = %req.uri()))]
pub async fn session_context(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = match extract_token(req.headers()) {
        Some(token) => resolve_context(&state, &token).await?,
        None => RequestContext::anonymous(),
    };

    if let Some(user) = &context.user {
        debug!(user_id = %user.id, role = %user.role, "Request authenticated");
    }
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

async fn resolve_context(state: &AppState, token: &str) -> Result<RequestContext, AppError> {
    let session = match state.session_service.validate_session(token).await {
        Ok(session) => session,
        Err(AppError::Unauthenticated(reason)) => {
            debug!(reason = %reason, "Treating request as anonymous");
            return Ok(RequestContext::anonymous());
        }
        Err(e) => return Err(e),
    };

    match state.repository.get_user(&session.user_id).await? {
        Some(user) => Ok(RequestContext::authenticated(
            AuthenticatedUser::from(&user),
            session.id,
        )),
        None => {
            warn!(session_id = %session.id, "Session belongs to a deleted user");
            Ok(RequestContext::anonymous())
        }
    }
}
