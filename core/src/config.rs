//! Client configuration.
//!
//! Resolution order: built-in defaults, then a TOML file (explicit path,
//! `$SALESDESK_CONFIG`, or `./salesdesk.toml` when present), then
//! environment overrides.
//!
//! ```toml
//! base_url = "https://backend.example.com"
//! timeout_secs = 20
//! expiry_header = "x-token-expiring"
//! session_file = "/var/lib/salesdesk/session.json"
//! export_dir = "exports"
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};

pub const CONFIG_ENV: &str = "SALESDESK_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "salesdesk.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin, without the `/api` prefix.
    pub base_url: String,
    /// Prefix joined to `base_url` for every request path.
    pub api_prefix: String,
    pub timeout_secs: u64,
    /// Response header that announces the token will expire soon.
    pub expiry_header: String,
    /// Persist the session to disk. When false the session lives in memory.
    pub persist_session: bool,
    /// Session file; defaults to `<config dir>/salesdesk/session.json`.
    pub session_file: Option<PathBuf>,
    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_prefix: "/api".to_string(),
            timeout_secs: 30,
            expiry_header: "x-token-expiring".to_string(),
            persist_session: true,
            session_file: None,
            export_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `path`, the env-selected file, or defaults,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let mut config = match explicit {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => match std::fs::read_to_string(DEFAULT_CONFIG_FILE) {
                Ok(text) => Self::from_toml_str(&text)?,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
                Err(err) => return Err(err.into()),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `SALESDESK_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SALESDESK_BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = lookup("SALESDESK_TIMEOUT_SECS") {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("SALESDESK_TIMEOUT_SECS is not a number: {raw}"))
            })?;
        }
        if let Some(dir) = lookup("SALESDESK_EXPORT_DIR") {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("SALESDESK_SESSION_FILE") {
            self.session_file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) origin, got `{url}`"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.expiry_header.trim().is_empty() {
            return Err(ConfigError::Invalid("expiry_header must not be empty".into()));
        }
        Ok(())
    }

    /// `base_url` joined with `api_prefix`, without a trailing slash.
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        let prefix = self.api_prefix.trim().trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{prefix}")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Session store selected by this configuration.
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        if !self.persist_session {
            return Arc::new(MemorySessionStore::new());
        }
        match self
            .session_file
            .clone()
            .or_else(FileSessionStore::default_path)
        {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => {
                tracing::warn!("no config directory available; keeping session in memory");
                Arc::new(MemorySessionStore::new())
            }
        }
    }
}
