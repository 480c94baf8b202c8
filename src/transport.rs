//! HTTP transport seam
//!
//! [`FetchPipeline`](crate::FetchPipeline) talks to the network only through
//! [`HttpTransport`]. The default [`ReqwestTransport`] wraps a shared
//! `reqwest::Client`; other implementations can route requests elsewhere, or
//! script responses and their timing.

use crate::config::FetchConfig;
use crate::error::{Error, Result, TransportError};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Raw response as seen by the pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Complete response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response from a status and body
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing GET requests
///
/// Implementations return `Err` only for transport-level failures. Any response
/// the server sends, including error statuses, is returned as `Ok`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request and read the full body
    async fn get(&self, url: &Url) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by `reqwest`
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a client with the configured timeout and user agent
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    /// Wrap an existing client
    pub fn from_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_error(&self, url: &Url, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
            .into()
        } else {
            TransportError::Request(e).into()
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_error(url, e))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
