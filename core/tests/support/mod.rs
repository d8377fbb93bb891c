//! Shared fixtures for the integration tests.
//!
//! `FakeBackend` is a scripted `Transport` that accepts exactly one token at
//! a time and rotates it on every refresh, which makes refresh races
//! deterministic. `spawn_mock` starts the real axum backend on a random
//! port for end-to-end runs.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use salesdesk_core::services::auth::REFRESH_PATH;
use salesdesk_core::{
    ApiClient, ApiError, HttpRequest, HttpResponse, MemorySessionStore, Session, SessionError,
    SessionStore, Transport,
};
use serde_json::json;

/// One request as the backend received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub path: String,
    pub token: Option<String>,
}

#[derive(Debug)]
struct Script {
    valid_token: String,
    issued: u32,
    refresh_calls: u32,
    refresh_fails: bool,
    /// Path answered with 401 even for the valid token.
    rejected_path: Option<String>,
    /// Code sent with 401 responses for a wrong token.
    reject_code: &'static str,
    /// Remaining successful responses that carry the expiry warning.
    expiring_responses: u32,
    calls: Vec<Call>,
}

#[derive(Debug, Clone)]
pub struct FakeBackend {
    script: Arc<Mutex<Script>>,
    refresh_delay: Duration,
    request_delay: Duration,
}

impl FakeBackend {
    /// Backend that currently accepts `token`.
    pub fn accepting(token: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                valid_token: token.to_string(),
                issued: 0,
                refresh_calls: 0,
                refresh_fails: false,
                rejected_path: None,
                reject_code: "TOKEN_EXPIRED",
                expiring_responses: 0,
                calls: Vec::new(),
            })),
            refresh_delay: Duration::ZERO,
            request_delay: Duration::ZERO,
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn failing_refresh(self) -> Self {
        self.script.lock().unwrap().refresh_fails = true;
        self
    }

    pub fn rejecting_path(self, path: &str) -> Self {
        self.script.lock().unwrap().rejected_path = Some(path.to_string());
        self
    }

    pub fn rejecting_with(self, code: &'static str) -> Self {
        self.script.lock().unwrap().reject_code = code;
        self
    }

    pub fn expiring_for(self, responses: u32) -> Self {
        self.script.lock().unwrap().expiring_responses = responses;
        self
    }

    pub fn valid_token(&self) -> String {
        self.script.lock().unwrap().valid_token.clone()
    }

    pub fn refresh_calls(&self) -> u32 {
        self.script.lock().unwrap().refresh_calls
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    /// Client with a stored session holding `token`.
    pub fn client_with_token(&self, token: &str) -> ApiClient {
        let sessions = Arc::new(MemorySessionStore::with_session(Session::new(token)));
        ApiClient::new(Arc::new(self.clone()), sessions)
    }

    /// Client whose session store holds `token` but rejects every write.
    pub fn client_with_read_only_store(&self, token: &str) -> ApiClient {
        let sessions = Arc::new(ReadOnlyStore(MemorySessionStore::with_session(
            Session::new(token),
        )));
        ApiClient::new(Arc::new(self.clone()), sessions)
    }

    fn refresh(&self) -> HttpResponse {
        let mut script = self.script.lock().unwrap();
        script.refresh_calls += 1;
        if script.refresh_fails {
            return respond(401, json!({"success": false, "message": "refresh denied"}), false);
        }
        script.issued += 1;
        script.valid_token = format!("token-{}", script.issued);
        respond(200, json!({"success": true, "token": script.valid_token}), false)
    }

    fn serve(&self, request: &HttpRequest) -> HttpResponse {
        let mut script = self.script.lock().unwrap();
        let token = request.bearer();
        let rejected = token != Some(script.valid_token.as_str())
            || script.rejected_path.as_deref() == Some(request.path.as_str());
        if rejected {
            let code = script.reject_code;
            return respond(401, json!({"error": "rejected", "code": code}), false);
        }
        let expiring = script.expiring_responses > 0;
        if expiring {
            script.expiring_responses -= 1;
        }
        respond(
            200,
            json!({"success": true, "data": {"path": request.path}}),
            expiring,
        )
    }
}

fn respond(status: u16, body: serde_json::Value, expiring: bool) -> HttpResponse {
    let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
    if expiring {
        headers.push(("x-token-expiring".to_string(), "true".to_string()));
    }
    HttpResponse {
        status,
        headers,
        body: body.to_string(),
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.script.lock().unwrap().calls.push(Call {
            path: request.path.clone(),
            token: request.bearer().map(str::to_string),
        });
        if request.path == REFRESH_PATH {
            tokio::time::sleep(self.refresh_delay).await;
            return Ok(self.refresh());
        }
        tokio::time::sleep(self.request_delay).await;
        Ok(self.serve(&request))
    }
}

/// Session store that can be read but never written, like a token file on
/// a read-only mount.
#[derive(Debug)]
pub struct ReadOnlyStore(MemorySessionStore);

impl SessionStore for ReadOnlyStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        self.0.load()
    }

    fn save(&self, _session: &Session) -> Result<(), SessionError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }

    fn clear(&self) -> Result<(), SessionError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

/// Start the mock backend on `127.0.0.1:0` and return its API root URL.
pub async fn spawn_mock(state: mock_server::AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with_state(listener, state));
    format!("http://{addr}/api")
}
