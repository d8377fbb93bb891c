//! The I/O seam between `ApiClient` and the network.
//!
//! `ApiClient` only ever talks to a `Transport`, which turns an
//! `HttpRequest` into an `HttpResponse`. Non-2xx statuses are data, not
//! errors: the client interprets them. Only failures to complete the
//! exchange surface as `ApiError::Transport`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// `Transport` backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    api_root: String,
}

impl ReqwestTransport {
    /// `api_root` is the absolute URL every request path is appended to,
    /// e.g. `https://backend.example.com/api`.
    pub fn new(api_root: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_root: api_root.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_root(), config.timeout())
    }

    pub fn url_for(&self, request: &HttpRequest) -> String {
        format!("{}{}", self.api_root, request.target())
    }
}

fn method_of(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = self.url_for(&request);
        let mut builder = self.http.request(method_of(request.method), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::trace!(method = %request.method, %url, status, "http exchange");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
