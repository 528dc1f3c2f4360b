use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{extract_token, validate_jwt, AuthError, AuthMethod, AuthUser};
use crate::error::ApiError;

/// Authentication middleware: a JWT from the Authorization header, falling back
/// to the session cookie when no JWT scheme is used. Injects [`AuthUser`] into request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_user(&state, request.method(), request.headers())
        .await
        .map_err(|e| {
            tracing::debug!("Authentication failed for {} {}: {}", request.method(), request.uri().path(), e);
            ApiError::from(e)
        })?;

    tracing::debug!("Authenticated user {} via {:?}", user.user_id, user.method);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, method: &Method, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
    let security = &state.config.security;

    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidHeader("Header contains invalid characters."))?;
        if let Some(token) = extract_token(value)? {
            let claims = validate_jwt(token, security)?;
            return Ok(AuthUser::from(claims));
        }
    }

    let session_key = cookie_value(headers, &security.session_cookie_name).ok_or(AuthError::MissingCredentials)?;
    let user = state
        .sessions
        .load(&session_key)
        .await?
        .ok_or(AuthError::MissingCredentials)?;

    if !is_safe_method(method) {
        enforce_csrf(headers, &security.csrf_cookie_name)?;
    }

    Ok(AuthUser { method: AuthMethod::Session, ..user })
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

/// Session callers must echo the CSRF cookie in the `X-CSRFToken` header
fn enforce_csrf(headers: &HeaderMap, cookie_name: &str) -> Result<(), AuthError> {
    let cookie = cookie_value(headers, cookie_name).ok_or(AuthError::CsrfFailed)?;
    let header = headers
        .get("x-csrftoken")
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::CsrfFailed)?;

    if cookie.is_empty() || cookie != header {
        return Err(AuthError::CsrfFailed);
    }
    Ok(())
}

/// Find a cookie by name across all `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}
