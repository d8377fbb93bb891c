//! The `{ success, data, ... }` wrapper every backend operation returns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpResponse;

/// Response body of a backend operation, kept verbatim.
///
/// `success: false` is a business outcome, not an error: callers branch on
/// `success` and show `failure_message()` to the user. Fields outside the
/// common set (`token`, `total`, `page`, ...) land in `extra` in the order
/// the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Interpret a raw response: 2xx bodies parse into an envelope, 404 maps
    /// to `NotFound`, other statuses to `Http`.
    pub fn from_response(response: HttpResponse) -> Result<Self, ApiError> {
        if response.is_success() {
            if response.body.trim().is_empty() {
                return Ok(Self {
                    success: true,
                    ..Self::default()
                });
            }
            return serde_json::from_str(&response.body)
                .map_err(|e| ApiError::Deserialization(e.to_string()));
        }
        if response.status == 404 {
            return Err(ApiError::NotFound);
        }
        Err(ApiError::Http {
            status: response.status,
            body: response.body,
        })
    }

    /// Server-provided explanation of a failed operation.
    pub fn failure_message(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }

    /// Deserialize `data` into a concrete type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Top-level field outside the common set.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Access token carried by a login or refresh envelope, either at the
    /// top level or inside `data`.
    pub fn token(&self) -> Option<&str> {
        self.field("token")
            .or_else(|| self.data.get("token"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }

    /// User profile carried by a login envelope.
    pub fn user(&self) -> Option<&Value> {
        self.field("user").or_else(|| self.data.get("user"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn business_failure_is_not_an_error() {
        let envelope =
            Envelope::from_response(ok(r#"{"success":false,"message":"Stock too low"}"#)).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.failure_message(), Some("Stock too low"));
    }

    #[test]
    fn extra_fields_are_preserved_in_order() {
        let envelope = Envelope::from_response(ok(
            r#"{"success":true,"data":[1,2],"total":2,"page":1}"#,
        ))
        .unwrap();
        let keys: Vec<&str> = envelope.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, ["total", "page"]);
        assert_eq!(envelope.data_as::<Vec<u32>>().unwrap(), vec![1, 2]);
    }

    #[test]
    fn token_is_found_at_top_level_or_in_data() {
        let top = Envelope::from_response(ok(r#"{"success":true,"token":"abc"}"#)).unwrap();
        assert_eq!(top.token(), Some("abc"));

        let nested =
            Envelope::from_response(ok(r#"{"success":true,"data":{"token":"xyz"}}"#)).unwrap();
        assert_eq!(nested.token(), Some("xyz"));

        let empty = Envelope::from_response(ok(r#"{"success":true,"token":""}"#)).unwrap();
        assert_eq!(empty.token(), None);
    }

    #[test]
    fn not_found_and_http_errors() {
        let err = Envelope::from_response(HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: String::new(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        let err = Envelope::from_response(HttpResponse {
            status: 422,
            headers: Vec::new(),
            body: r#"{"success":false}"#.to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 422, .. }));
    }

    #[test]
    fn bad_json_is_deserialization_error() {
        let err = Envelope::from_response(ok("<html>")).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn empty_success_body_is_successful_envelope() {
        let envelope = Envelope::from_response(HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        })
        .unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Value::Null);
    }
}
