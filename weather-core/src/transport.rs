//! HTTP seam under the fallback client.
//!
//! A [`Transport`] only answers one question: did a response come back, and if
//! so with which status and body. Deciding what that means is left to
//! [`crate::fetch::FallbackClient`].

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A response that made it back, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// No response at all: refused, blocked, DNS, TLS, reset, timeout.
    #[error("network error: {0}")]
    Network(#[source] BoxError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`ReqwestTransport::new`] with an overall per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        Ok(Self { http })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Network(Box::new(err))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        let res = self.http.get(url.clone()).send().await.map_err(classify)?;

        let status = res.status().as_u16();
        // A body cut off mid-stream is as good as no response.
        let body = res.text().await.map_err(classify)?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_2xx() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(301, "").is_success());
        assert!(!RawResponse::new(404, "").is_success());
        assert!(!RawResponse::new(500, "").is_success());
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let transport = ReqwestTransport::new();
        let url = Url::parse("http://127.0.0.1:1/current").unwrap();

        let err = transport.get(&url).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
    }
}
