//! In-memory backend implementing the salesdesk REST contract.
//!
//! Serves the auth endpoints with real token semantics (expiry codes, the
//! expiry-warning header, rotation on refresh) and a generic collection for
//! every resource path, so the client can be exercised end-to-end. Tests
//! drive token state through `AppState` hooks instead of waiting on clocks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};

mod auth;
mod collections;
mod reports;

pub use auth::EXPIRY_HEADER;

/// Resource collections served under `/api/<name>`.
pub const COLLECTIONS: &[&str] = &[
    "staff",
    "distributors",
    "tasks",
    "supply-estimates",
    "brands",
    "variants",
    "products",
    "marketing-activities",
    "staff-activities",
    "orders",
    "damage-claims",
    "sales-inquiries",
    "shops",
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MockUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub users: Vec<MockUser>,
    /// Artificial latency of the refresh endpoint, to widen race windows.
    pub refresh_delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            users: vec![MockUser {
                id: "u-admin".to_string(),
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                password: "admin123".to_string(),
                role: "admin".to_string(),
            }],
            refresh_delay: Duration::ZERO,
        }
    }
}

/// Lifecycle of an issued access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    /// Accepted, but responses carry the expiry-warning header.
    Expiring,
    Expired,
}

#[derive(Clone, Debug)]
pub(crate) struct TokenRecord {
    pub(crate) email: String,
    pub(crate) status: TokenStatus,
}

/// One request seen by the authenticated routes or the refresh endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub token: Option<String>,
}

pub(crate) struct Shared {
    pub(crate) config: MockConfig,
    pub(crate) users: RwLock<Vec<MockUser>>,
    pub(crate) tokens: RwLock<HashMap<String, TokenRecord>>,
    pub(crate) collections: RwLock<HashMap<String, Vec<Value>>>,
    pub(crate) movements: RwLock<Vec<Value>>,
    pub(crate) refresh_calls: AtomicUsize,
    pub(crate) refresh_failing: AtomicBool,
    pub(crate) requests: Mutex<Vec<RequestRecord>>,
}

/// Shared backend state; clones observe the same data.
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<Shared>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl AppState {
    pub fn new(config: MockConfig) -> Self {
        let users = config.users.clone();
        Self {
            inner: Arc::new(Shared {
                config,
                users: RwLock::new(users),
                tokens: RwLock::new(HashMap::new()),
                collections: RwLock::new(HashMap::new()),
                movements: RwLock::new(Vec::new()),
                refresh_calls: AtomicUsize::new(0),
                refresh_failing: AtomicBool::new(false),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Issue a valid token for `email` without going through login.
    pub async fn issue_token(&self, email: &str) -> String {
        let token = format!("tok-{}", uuid::Uuid::new_v4().simple());
        self.inner.tokens.write().await.insert(
            token.clone(),
            TokenRecord {
                email: email.to_string(),
                status: TokenStatus::Valid,
            },
        );
        token
    }

    pub async fn token_status(&self, token: &str) -> Option<TokenStatus> {
        self.inner.tokens.read().await.get(token).map(|t| t.status)
    }

    /// Move every issued token to `status`.
    pub async fn set_all_tokens(&self, status: TokenStatus) {
        for record in self.inner.tokens.write().await.values_mut() {
            record.status = status;
        }
    }

    /// Forget every issued token; subsequent requests get `INVALID_TOKEN`.
    pub async fn revoke_all_tokens(&self) {
        self.inner.tokens.write().await.clear();
    }

    /// Make the refresh endpoint reject every call.
    pub fn set_refresh_failing(&self, failing: bool) {
        self.inner.refresh_failing.store(failing, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RequestRecord> {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn record(&self, method: &str, path: &str, token: Option<&str>) {
        self.inner
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RequestRecord {
                method: method.to_string(),
                path: path.to_string(),
                token: token.map(str::to_string),
            });
    }
}

/// Collection a generic handler operates on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Collection(pub(crate) &'static str);

pub(crate) fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

pub fn app() -> Router {
    app_with_state(AppState::default())
}

pub fn app_with_state(state: AppState) -> Router {
    let mut protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/analytics/{report}", get(reports::analytics))
        .nest(
            "/api/inventory",
            reports::inventory_routes()
                .merge(collections::routes())
                .layer(Extension(Collection("inventory"))),
        );
    for name in COLLECTIONS {
        protected = protected.nest(
            &format!("/api/{name}"),
            collections::routes().layer(Extension(Collection(name))),
        );
    }
    let protected =
        protected.route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh-token", post(auth::refresh_token))
        .merge(protected)
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}
