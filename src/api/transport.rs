//! Wire transport
//!
//! The dispatch engine only needs "send this request, give me the body back".
//! [`HttpTransport`] is the production implementation; tests plug in their own.

use super::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use super::error::{CrmError, Result};
use super::request::Request;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and return the raw response body
    async fn fire(&self, request: &Request) -> Result<String>;
}

/// Transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("zoho-crm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrmError::transport(None, format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_custom_client(base_url, http_client))
    }

    /// Transport for the default host and timeout
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport around an existing HTTP client
    pub fn with_custom_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fire(&self, request: &Request) -> Result<String> {
        debug!("GET {} ({})", request.endpoint(&self.base_url), request);

        let response = self
            .http_client
            .get(request.to_url(&self.base_url))
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);

        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(CrmError::transport(Some(status.as_u16()), body))
        }
    }
}
