//! Error types for the salesdesk client.
//!
//! # Design
//! `ApiError` separates the three 401 outcomes callers must tell apart: a
//! credential the client could not recover (`Unauthorized`), a refresh
//! attempt that itself failed (`RefreshFailed`), and a session-validation
//! call that failed even after a refresh (`SessionExpired`). Business
//! failures (`success: false` envelopes) are not errors at all; they come
//! back as an `Envelope` for the caller to inspect.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `ApiClient` and the transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached the server or no response came back.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 401 and the client could not recover.
    #[error("unauthorized ({code}): {message}")]
    Unauthorized { code: String, message: String },

    /// A refresh-eligible 401 could not be recovered because the refresh
    /// call failed. The session has been destroyed.
    #[error("token refresh failed: {0}")]
    RefreshFailed(RefreshFailure),

    /// The session-validation call was rejected after a refresh. The
    /// session has been destroyed.
    #[error("session expired; log in again")]
    SessionExpired,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 401 or 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("session store: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// HTTP status associated with this error, when there is one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } | Self::SessionExpired => Some(401),
            Self::RefreshFailed(failure) => failure.status,
            Self::NotFound => Some(404),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the caller should send the user back to the login screen.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::RefreshFailed(_) | Self::SessionExpired
        )
    }
}

/// Outcome of a failed refresh call, shared by every request that waited
/// on it. Cloneable because each waiter receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RefreshFailure {
    /// Status of the refresh response; `None` when the call never completed.
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// Errors raised by session stores.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed session record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors when loading or validating client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from the CSV export utility.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("invalid export filename: {0:?}")]
    InvalidFilename(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_require_login() {
        let unauthorized = ApiError::Unauthorized {
            code: "INVALID_TOKEN".into(),
            message: "bad token".into(),
        };
        assert!(unauthorized.requires_login());
        assert_eq!(unauthorized.status_code(), Some(401));
        assert!(ApiError::SessionExpired.requires_login());
        assert!(!ApiError::NotFound.requires_login());
    }

    #[test]
    fn refresh_failure_status_passes_through() {
        let err = ApiError::RefreshFailed(RefreshFailure::new(Some(403), "revoked"));
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.to_string(), "token refresh failed: revoked");

        let err = ApiError::RefreshFailed(RefreshFailure::new(None, "connection reset"));
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn http_error_display_includes_body() {
        let err = ApiError::Http {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn config_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("x = [unclosed").unwrap_err();
        let err = ConfigError::from(toml_err);
        assert!(err.to_string().starts_with("toml:"));
    }
}
