//! Client layer for the salesdesk administration backend.
//!
//! # Overview
//! Service modules build `HttpRequest` values without touching the network;
//! `ApiClient` executes them with the stored bearer token and recovers
//! expired tokens transparently through a single shared refresh. The
//! `export` module turns tabular results into CSV files.
//!
//! # Design
//! - Requests and responses are plain data (`http`), so builders are pure
//!   and the network sits behind the `Transport` trait.
//! - `ApiClient` owns its refresh lock (`RefreshCoordinator`) and session
//!   store; nothing is process-global, so several clients can coexist.
//! - Responses are returned as the server's `Envelope`, unchanged.
//!
//! ```no_run
//! use salesdesk_core::services::orders::{self, OrderFilter};
//! use salesdesk_core::{ApiClient, ClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load(None)?;
//! let client = ApiClient::from_config(&config)?;
//! client.login("admin@example.com", "secret").await?;
//! let pending = OrderFilter {
//!     status: Some("pending".into()),
//!     ..OrderFilter::default()
//! };
//! let envelope = client.fetch(orders::list(&pending)).await?;
//! println!("{}", envelope.data);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod export;
pub mod http;
pub mod refresh;
pub mod services;
pub mod session;
pub mod transport;

pub use client::{ApiClient, AuthState, LogoutReason};
pub use config::ClientConfig;
pub use envelope::Envelope;
pub use error::{ApiError, ConfigError, ExportError, RefreshFailure, SessionError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Query};
pub use refresh::RefreshCoordinator;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use transport::{ReqwestTransport, Transport};
