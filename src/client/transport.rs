//! # HTTP Transport Abstraction
//!
//! The remote client never talks to the network directly. It goes through an
//! [`HttpTransport`], which the application wires to [`ReqwestTransport`] and
//! tests replace with an in-memory fake.
//!
//! ## Contract
//!
//! A transport returns `Ok(HttpResponse)` for *any* HTTP answer, including
//! 4xx and 5xx. `Err(TransportError)` is reserved for failures where no answer
//! arrived at all: connection refused, DNS failure, timeout, truncated body.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A complete HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code (e.g., 200, 400, 500)
    pub status: u16,
    /// Canonical reason phrase (e.g., "Bad Request"), may be empty
    pub status_text: String,
    /// Raw response body
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// No HTTP answer could be obtained.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Injected HTTP capability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request.
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError>;

    /// POST an already-serialized JSON body with `Content-Type: application/json`.
    async fn post_json(
        &self,
        url: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError> {
        (**self).get(url, timeout).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        (**self).post_json(url, body, timeout).await
    }
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(Self { client })
    }

    async fn finish(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Self::finish(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: String,
        timeout: Duration,
    ) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Self::finish(response).await
    }
}
