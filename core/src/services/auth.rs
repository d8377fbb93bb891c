//! Authentication endpoints.
//!
//! Login and session validation go through `ApiClient::login` and
//! `ApiClient::me`, which also maintain the stored session; the builders
//! here only describe the wire shape.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REFRESH_PATH: &str = "/auth/refresh-token";
/// Session-validation ("who am I") endpoint.
pub const SESSION_CHECK_PATH: &str = "/auth/me";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";

/// 401 codes the client recovers from by refreshing.
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const TOKEN_EXPIRING: &str = "TOKEN_EXPIRING";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Body of a 401 response: `{ "error": ..., "code": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthFailure {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl AuthFailure {
    /// Parse a 401 body; anything unparseable becomes an empty failure,
    /// which is not refresh-eligible.
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn is_refresh_eligible(&self) -> bool {
        matches!(self.code.as_deref(), Some(TOKEN_EXPIRED | TOKEN_EXPIRING))
    }

    pub fn into_error(self) -> ApiError {
        ApiError::Unauthorized {
            code: self.code.unwrap_or_else(|| "UNAUTHORIZED".to_string()),
            message: self
                .error
                .or(self.message)
                .unwrap_or_else(|| "authentication required".to_string()),
        }
    }
}

/// Body of the refresh endpoint: `{ "success": bool, "token"?: string }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub fn login(credentials: &Credentials) -> Result<HttpRequest, ApiError> {
    HttpRequest::json(HttpMethod::Post, LOGIN_PATH, credentials)
}

pub fn me() -> HttpRequest {
    HttpRequest::get(SESSION_CHECK_PATH)
}

pub fn refresh_token() -> HttpRequest {
    HttpRequest::new(HttpMethod::Post, REFRESH_PATH)
}

pub fn change_password(change: &PasswordChange) -> Result<HttpRequest, ApiError> {
    HttpRequest::json(HttpMethod::Post, CHANGE_PASSWORD_PATH, change)
}

/// True for the session-validation call, whose repeated 401 ends the session.
pub fn is_session_check(request: &HttpRequest) -> bool {
    request.method == HttpMethod::Get && request.path == SESSION_CHECK_PATH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_expiry_codes_are_refresh_eligible() {
        assert!(AuthFailure::parse(r#"{"error":"expired","code":"TOKEN_EXPIRED"}"#)
            .is_refresh_eligible());
        assert!(AuthFailure::parse(r#"{"code":"TOKEN_EXPIRING"}"#).is_refresh_eligible());
        assert!(!AuthFailure::parse(r#"{"code":"INVALID_TOKEN"}"#).is_refresh_eligible());
        assert!(!AuthFailure::parse("Unauthorized").is_refresh_eligible());
    }

    #[test]
    fn ineligible_failure_keeps_server_code_and_message() {
        let err = AuthFailure::parse(r#"{"error":"account disabled","code":"USER_INACTIVE"}"#)
            .into_error();
        match err {
            ApiError::Unauthorized { code, message } => {
                assert_eq!(code, "USER_INACTIVE");
                assert_eq!(message, "account disabled");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn login_posts_credentials() {
        let request = login(&Credentials {
            email: "admin@example.com".into(),
            password: "secret".into(),
        })
        .unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, LOGIN_PATH);
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "admin@example.com");
    }

    #[test]
    fn change_password_uses_camel_case() {
        let request = change_password(&PasswordChange {
            current_password: "a".into(),
            new_password: "b".into(),
        })
        .unwrap();
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["currentPassword"], "a");
        assert_eq!(body["newPassword"], "b");
    }

    #[test]
    fn session_check_is_get_auth_me_only() {
        assert!(is_session_check(&me()));
        assert!(!is_session_check(&HttpRequest::new(HttpMethod::Post, SESSION_CHECK_PATH)));
        assert!(!is_session_check(&refresh_token()));
    }
}
