//! Login, token refresh, and the bearer-token middleware.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{reply, AppState, MockUser, TokenStatus};

/// Response header set while the presented token is close to expiry.
pub const EXPIRY_HEADER: &str = "x-token-expiring";

/// Account resolved by `require_auth` for the current request.
#[derive(Clone, Debug)]
pub(crate) struct CurrentUser {
    pub(crate) email: String,
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn unauthorized(error: &str, code: &str) -> Response {
    reply(
        StatusCode::UNAUTHORIZED,
        json!({ "success": false, "error": error, "code": code }),
    )
}

fn public_profile(user: &MockUser) -> Value {
    json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
    })
}

pub(crate) async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer(request.headers()).map(str::to_string);
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path().to_string(), |uri| uri.path().to_string());
    state.record(request.method().as_str(), &path, token.as_deref());

    let Some(token) = token else {
        return unauthorized("No token provided", "NO_TOKEN");
    };
    let record = state.inner.tokens.read().await.get(&token).cloned();
    let Some(record) = record else {
        return unauthorized("Invalid token", "INVALID_TOKEN");
    };
    if record.status == TokenStatus::Expired {
        debug!(%path, "rejecting expired token");
        return unauthorized("Token expired", "TOKEN_EXPIRED");
    }

    request.extensions_mut().insert(CurrentUser {
        email: record.email,
    });
    let mut response = next.run(request).await;
    if record.status == TokenStatus::Expiring {
        response.headers_mut().insert(
            HeaderName::from_static(EXPIRY_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    response
}

pub(crate) async fn login(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "Email and password are required" }),
        );
    }

    let user = state
        .inner
        .users
        .read()
        .await
        .iter()
        .find(|user| user.email.eq_ignore_ascii_case(email) && user.password == password)
        .cloned();
    let Some(user) = user else {
        return unauthorized("Invalid credentials", "INVALID_CREDENTIALS");
    };

    let token = state.issue_token(&user.email).await;
    info!(email = %user.email, "login");
    reply(
        StatusCode::OK,
        json!({ "success": true, "token": token, "user": public_profile(&user) }),
    )
}

/// Exchange the presented token for a new one. Expired tokens are accepted;
/// the old token is marked expired once replaced.
pub(crate) async fn refresh_token(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = bearer(&headers);
    state.record("POST", "/api/auth/refresh-token", token);
    let call = state
        .inner
        .refresh_calls
        .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
        + 1;

    let delay = state.inner.config.refresh_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if state
        .inner
        .refresh_failing
        .load(std::sync::atomic::Ordering::SeqCst)
    {
        return unauthorized("Refresh rejected", "REFRESH_FAILED");
    }

    let Some(token) = token else {
        return unauthorized("No token provided", "NO_TOKEN");
    };
    let email = {
        let mut tokens = state.inner.tokens.write().await;
        match tokens.get_mut(token) {
            Some(record) => {
                record.status = TokenStatus::Expired;
                record.email.clone()
            }
            None => return unauthorized("Invalid refresh token", "INVALID_TOKEN"),
        }
    };

    let fresh = state.issue_token(&email).await;
    info!(%email, call, "token refreshed");
    reply(StatusCode::OK, json!({ "success": true, "token": fresh }))
}

pub(crate) async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Response {
    let users = state.inner.users.read().await;
    match users.iter().find(|user| user.email == current.email) {
        Some(user) => reply(
            StatusCode::OK,
            json!({ "success": true, "data": public_profile(user) }),
        ),
        None => unauthorized("User no longer exists", "USER_NOT_FOUND"),
    }
}

pub(crate) async fn change_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Response {
    let current_password = body
        .get("currentPassword")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let new_password = body
        .get("newPassword")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if new_password.len() < 6 {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "New password must be at least 6 characters" }),
        );
    }

    let mut users = state.inner.users.write().await;
    let Some(user) = users.iter_mut().find(|user| user.email == current.email) else {
        return unauthorized("User no longer exists", "USER_NOT_FOUND");
    };
    if user.password != current_password {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "message": "Current password is incorrect" }),
        );
    }
    user.password = new_password.to_string();
    info!(email = %current.email, "password changed");
    reply(
        StatusCode::OK,
        json!({ "success": true, "message": "Password updated" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer(&headers), None);
    }
}
