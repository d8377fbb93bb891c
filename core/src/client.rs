//! Authenticated API client with transparent token refresh.
//!
//! # Design
//! Every request goes through `ApiClient::send`:
//!
//! 1. The stored access token, if any, is attached as a bearer credential.
//! 2. A 2xx response carrying the expiry-warning header starts a background
//!    refresh when none is in flight. The response is returned immediately.
//! 3. A 401 whose code is `TOKEN_EXPIRED` or `TOKEN_EXPIRING` awaits the
//!    single shared refresh (starting it if needed) and replays the request
//!    once with the new token. Any other 401 is returned to the caller.
//! 4. A replayed request that fails with 401 again is final. If it was the
//!    session-validation call, the session is destroyed as well.
//! 5. A failed refresh ends the session only for requests that were waiting
//!    on it. A failed background refresh is logged and the current token
//!    stays in use.
//!
//! The retry counter lives on an immutable `Outbound` wrapper rather than
//! on the request, so replays never share mutable state. The refresh lock
//! is the per-client `RefreshCoordinator`.
//!
//! Where a browser would redirect to the login screen, the client publishes
//! `AuthState::LoggedOut` on a watch channel.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::envelope::Envelope;
use crate::error::{ApiError, RefreshFailure};
use crate::http::{HttpRequest, HttpResponse};
use crate::refresh::{Flight, RefreshCoordinator, RefreshOutcome, SharedRefresh};
use crate::services::auth::{self, AuthFailure, Credentials, RefreshResponse};
use crate::session::{Session, SessionStore};
use crate::transport::{ReqwestTransport, Transport};

/// Requests are replayed at most this many times after a refresh.
const MAX_RETRIES: u8 = 1;

/// Authentication state observed through `ApiClient::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No session has been established.
    Anonymous,
    Authenticated,
    /// The session was destroyed; the user has to log in again.
    LoggedOut(LogoutReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// A refresh-eligible 401 could not be recovered.
    RefreshFailed,
    /// The session-validation call was rejected after a refresh.
    SessionInvalid,
}

/// One outbound request plus the number of times it has been replayed.
#[derive(Debug, Clone)]
pub(crate) struct Outbound {
    request: Arc<HttpRequest>,
    attempt: u8,
}

impl Outbound {
    pub(crate) fn new(request: HttpRequest) -> Self {
        Self {
            request: Arc::new(request),
            attempt: 0,
        }
    }

    pub(crate) fn attempt(&self) -> u8 {
        self.attempt
    }

    pub(crate) fn can_retry(&self) -> bool {
        self.attempt < MAX_RETRIES
    }

    /// The same request, marked as replayed once more.
    pub(crate) fn retried(&self) -> Self {
        Self {
            request: Arc::clone(&self.request),
            attempt: self.attempt.saturating_add(1),
        }
    }

    /// Wire form with `token` as the bearer credential.
    pub(crate) fn authorized(&self, token: Option<&str>) -> HttpRequest {
        self.request.with_bearer(token)
    }

    pub(crate) fn is_session_check(&self) -> bool {
        auth::is_session_check(&self.request)
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    sessions: Arc<dyn SessionStore>,
    refresh: Arc<RefreshCoordinator>,
    expiry_header: String,
    state: watch::Sender<AuthState>,
}

/// Client for the salesdesk REST API. Cheap to clone; clones share the
/// session, the refresh lock, and the auth-state channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, sessions: Arc<dyn SessionStore>) -> Self {
        Self::with_refresh_coordinator(transport, sessions, Arc::new(RefreshCoordinator::new()))
    }

    /// Client that refreshes through `refresh`, e.g. to observe its state
    /// from outside or to pre-seed it in tests.
    pub fn with_refresh_coordinator(
        transport: Arc<dyn Transport>,
        sessions: Arc<dyn SessionStore>,
        refresh: Arc<RefreshCoordinator>,
    ) -> Self {
        let initial = match sessions.load() {
            Ok(Some(_)) => AuthState::Authenticated,
            Ok(None) => AuthState::Anonymous,
            Err(err) => {
                warn!(error = %err, "failed to read stored session");
                AuthState::Anonymous
            }
        };
        let (state, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                transport,
                sessions,
                refresh,
                expiry_header: ClientConfig::default().expiry_header,
                state,
            }),
        }
    }

    /// Client with a reqwest transport and the configured session store.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::from_config(config)?);
        Ok(Self::new(transport, config.session_store()).with_expiry_header(&config.expiry_header))
    }

    /// Override the header that announces an expiring token.
    ///
    /// Only meaningful right after construction, before the client is cloned.
    pub fn with_expiry_header(mut self, header: &str) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.expiry_header = header.to_ascii_lowercase();
        } else {
            warn!("expiry header ignored: client already shared");
        }
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.load_session()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.is_refreshing()
    }

    /// Refreshes started by this client so far.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh.started()
    }

    /// Send `request` with credentials and transparent token recovery.
    ///
    /// Non-2xx statuses other than 401 are returned as responses; use
    /// `fetch` to turn them into errors.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut outbound = Outbound::new(request);
        let mut replay_token: Option<String> = None;
        loop {
            let token = replay_token.take().or_else(|| self.inner.access_token());
            let wire = outbound.authorized(token.as_deref());
            debug!(
                method = %wire.method,
                path = %wire.path,
                attempt = outbound.attempt(),
                "sending request"
            );
            let response = self.inner.transport.execute(wire).await?;

            if response.status != 401 {
                if response.is_success() {
                    self.watch_expiry(&response);
                }
                return Ok(response);
            }

            let failure = AuthFailure::parse(&response.body);
            if !outbound.can_retry() {
                if outbound.is_session_check() {
                    warn!("session validation rejected after refresh; ending session");
                    self.inner.destroy_session(LogoutReason::SessionInvalid);
                    return Err(ApiError::SessionExpired);
                }
                return Err(failure.into_error());
            }
            if !failure.is_refresh_eligible() {
                return Err(failure.into_error());
            }

            replay_token = Some(self.recover_token(token.as_deref()).await?);
            outbound = outbound.retried();
        }
    }

    /// `send` and parse the envelope.
    pub async fn fetch(&self, request: HttpRequest) -> Result<Envelope, ApiError> {
        let response = self.send(request).await?;
        Envelope::from_response(response)
    }

    /// Log in and persist the returned token.
    ///
    /// A `success: false` envelope is returned as-is and leaves the stored
    /// session untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Envelope, ApiError> {
        let request = auth::login(&Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let envelope = self.fetch(request).await?;
        if envelope.success {
            match envelope.token() {
                Some(token) => {
                    let session = Session::new(token).with_user(envelope.user().cloned());
                    self.inner.sessions.save(&session)?;
                    self.inner.state.send_replace(AuthState::Authenticated);
                    info!(email, "logged in");
                }
                None => warn!("login succeeded without a token; session not stored"),
            }
        }
        Ok(envelope)
    }

    /// Validate the session with the backend and cache the returned profile.
    pub async fn me(&self) -> Result<Envelope, ApiError> {
        let envelope = self.fetch(auth::me()).await?;
        if envelope.success && !envelope.data.is_null() {
            if let Some(session) = self.inner.load_session() {
                let updated = session.with_user(Some(envelope.data.clone()));
                if let Err(err) = self.inner.sessions.save(&updated) {
                    warn!(error = %err, "failed to cache user profile");
                }
            }
        }
        Ok(envelope)
    }

    /// End the session locally.
    pub fn logout(&self) {
        self.inner.destroy_session(LogoutReason::UserRequested);
    }

    /// Refresh the access token now, sharing any refresh already in flight.
    pub async fn refresh_session(&self) -> Result<String, ApiError> {
        let (refresh, _) = self.start_or_join_refresh();
        refresh.await.map_err(|failure| self.inner.refresh_failed(failure))
    }

    /// Obtain a token to replay a request that was rejected with `stale`.
    async fn recover_token(&self, stale: Option<&str>) -> Result<String, ApiError> {
        if let Some(current) = self.inner.access_token() {
            if stale != Some(current.as_str()) && !self.is_refreshing() {
                debug!("token rotated while request was in flight; replaying");
                return Ok(current);
            }
        }
        let (refresh, flight) = self.start_or_join_refresh();
        if flight == Flight::Joined {
            debug!("waiting for in-flight token refresh");
        }
        refresh.await.map_err(|failure| self.inner.refresh_failed(failure))
    }

    fn start_or_join_refresh(&self) -> (SharedRefresh, Flight) {
        let inner = Arc::clone(&self.inner);
        self.inner
            .refresh
            .join_or_start(move || async move { inner.perform_refresh().await })
    }

    /// Start a background refresh when the server warns the token is about
    /// to expire. Never blocks or fails the triggering response.
    fn watch_expiry(&self, response: &HttpResponse) {
        let expiring = response
            .header(&self.inner.expiry_header)
            .is_some_and(|value| matches!(value.trim(), "true" | "1"));
        if !expiring || self.is_refreshing() {
            return;
        }
        let (refresh, flight) = self.start_or_join_refresh();
        if flight == Flight::Started {
            info!("token expiring soon; refreshing in background");
            tokio::spawn(async move {
                if let Err(failure) = refresh.await {
                    warn!(error = %failure, "background token refresh failed");
                }
            });
        }
    }
}

impl Inner {
    fn load_session(&self) -> Option<Session> {
        match self.sessions.load() {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "failed to read stored session");
                None
            }
        }
    }

    fn access_token(&self) -> Option<String> {
        self.load_session().map(|session| session.access_token)
    }

    fn destroy_session(&self, reason: LogoutReason) {
        if let Err(err) = self.sessions.clear() {
            warn!(error = %err, "failed to clear stored session");
        }
        self.state.send_replace(AuthState::LoggedOut(reason));
        info!(?reason, "session ended");
    }

    /// End the session after a refresh that a waiting request depended on
    /// failed. Every waiter lands here; only the first one clears the store.
    fn refresh_failed(&self, failure: RefreshFailure) -> ApiError {
        if !matches!(*self.state.borrow(), AuthState::LoggedOut(_)) {
            self.destroy_session(LogoutReason::RefreshFailed);
        }
        ApiError::RefreshFailed(failure)
    }

    /// Body of the single-flight refresh: call the endpoint and persist the
    /// new token. Failures are only reported; the session is left to the
    /// callers that needed the new token.
    async fn perform_refresh(&self) -> RefreshOutcome {
        let session = self.load_session();
        let request = auth::refresh_token()
            .with_bearer(session.as_ref().map(|s| s.access_token.as_str()));
        info!("refreshing access token");

        let outcome = match self.transport.execute(request).await {
            Ok(response) => parse_refresh(&response),
            Err(err) => Err(RefreshFailure::new(None, err.to_string())),
        };

        match outcome {
            Ok(token) => {
                let rotated = match session {
                    Some(session) => session.with_token(token.as_str()),
                    None => Session::new(token.as_str()),
                };
                if let Err(err) = self.sessions.save(&rotated) {
                    warn!(error = %err, "failed to persist refreshed token");
                }
                self.state.send_replace(AuthState::Authenticated);
                debug!("access token refreshed");
                Ok(token)
            }
            Err(failure) => {
                warn!(error = %failure, "token refresh failed");
                Err(failure)
            }
        }
    }
}

fn parse_refresh(response: &HttpResponse) -> RefreshOutcome {
    let parsed: RefreshResponse = serde_json::from_str(&response.body).unwrap_or_default();
    let message = || {
        parsed
            .message
            .clone()
            .or_else(|| parsed.error.clone())
            .unwrap_or_else(|| format!("refresh rejected with status {}", response.status))
    };
    if !response.is_success() || !parsed.success {
        return Err(RefreshFailure::new(Some(response.status), message()));
    }
    match parsed.token.as_deref() {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(RefreshFailure::new(
            Some(response.status),
            "refresh response carried no token",
        )),
    }
}
