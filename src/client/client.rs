//! # Remote Operation Client
//!
//! Issues exactly one HTTP call per logical operation against the
//! steganography service and folds every possible outcome into either a typed
//! result or a single [`OrchestratorError`].
//!
//! ## Responsibility
//!
//! - `health_check()`: probe `/api/health`, return a status value, never an error
//! - `hide()`: encode cover image, POST `/api/hide`, decode the stego image
//! - `extract()`: encode stego image, POST `/api/extract`, return the text
//!
//! ## Error Normalization
//!
//! | What happened | Error |
//! |---|---|
//! | no HTTP answer (refused, DNS, timeout) | `Network` ("cannot connect to server") |
//! | non-2xx answer | `Service`, message from body `error` or the status line |
//! | 2xx with `success: false` | `Service`, message from body `error` or "operation failed" |
//!
//! The client holds no session state.

use log::{debug, info, warn};
use serde::Serialize;

use crate::client::transport::{HttpResponse, HttpTransport};
use crate::common::codec::{self, DisplayableImage};
use crate::common::config::ServiceConfig;
use crate::common::messages::{ExtractRequest, HideRequest, ServiceReply, Technique};
use crate::error::{OrchestratorError, Result, GENERIC_FAILURE};

pub const HEALTH_PATH: &str = "/api/health";
pub const HIDE_PATH: &str = "/api/hide";
pub const EXTRACT_PATH: &str = "/api/extract";

/// Outcome of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Connected,
    Disconnected,
}

/// Successful hide: the stego image ready for display and download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HideResult {
    pub stego_image: DisplayableImage,
    pub message: Option<String>,
}

/// Successful extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractResult {
    pub extracted_text: String,
    pub message: Option<String>,
}

/// Client for the remote steganography service.
///
/// # Fields
///
/// * `config` - Base URL and timeouts
/// * `transport` - Injected HTTP capability
pub struct RemoteClient<T: HttpTransport> {
    config: ServiceConfig,
    transport: T,
}

impl<T: HttpTransport> RemoteClient<T> {
    /// Creates a new client.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let transport = ReqwestTransport::new()?;
    /// let client = RemoteClient::new(config.service.clone(), transport);
    /// ```
    pub fn new(config: ServiceConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Probes the service.
    ///
    /// Resolves [`ServiceStatus::Connected`] on any 2xx answer with a JSON
    /// body and [`ServiceStatus::Disconnected`] on everything else, including
    /// transport failures.
    pub async fn health_check(&self) -> ServiceStatus {
        let url = self.url(HEALTH_PATH);

        match self.transport.get(&url, self.config.health_timeout()).await {
            Ok(response) if response.is_success() => {
                match response.json::<serde_json::Value>() {
                    Ok(body) => {
                        debug!("Health check OK: {}", body);
                        ServiceStatus::Connected
                    }
                    Err(e) => {
                        warn!("⚠️  Health check at {} returned non-JSON body: {}", url, e);
                        ServiceStatus::Disconnected
                    }
                }
            }
            Ok(response) => {
                warn!(
                    "⚠️  Health check at {} failed with HTTP {}",
                    url, response.status
                );
                ServiceStatus::Disconnected
            }
            Err(e) => {
                warn!("⚠️  Health check at {} could not connect: {}", url, e);
                ServiceStatus::Disconnected
            }
        }
    }

    /// Hides `secret_text` inside `image`.
    ///
    /// # Arguments
    ///
    /// * `technique` - Method the service should apply
    /// * `image` - Raw bytes of the cover image
    /// * `secret_text` - Text to embed
    /// * `encryption_key` - Key for `xor`/`aes`; ignored and sent empty for `lsb`
    ///
    /// # Errors
    ///
    /// `Network` when the service is unreachable, `Service` when it reports a
    /// failure or omits `stego_image`.
    pub async fn hide(
        &self,
        technique: Technique,
        image: &[u8],
        secret_text: &str,
        encryption_key: &str,
    ) -> Result<HideResult> {
        let request = HideRequest {
            technique,
            image: codec::encode_bytes(image),
            secret_text: secret_text.to_string(),
            encryption_key: wire_key(technique, encryption_key),
        };

        info!(
            "📤 Hiding {} bytes of text in {} byte image using {}",
            secret_text.len(),
            image.len(),
            technique.display_name()
        );

        let (status, reply) = self.dispatch(HIDE_PATH, &request).await?;

        let stego = reply.stego_image.ok_or_else(|| OrchestratorError::Service {
            status,
            message: "response is missing stego_image".to_string(),
        })?;

        let stego_image = codec::decode_str(&stego);
        if stego_image.is_broken() {
            warn!("⚠️  Service returned a stego image that is not valid base64");
        }

        info!("✅ Hide complete ({} chars of stego payload)", stego.len());

        Ok(HideResult {
            stego_image,
            message: reply.message,
        })
    }

    /// Extracts hidden text from `image`.
    pub async fn extract(
        &self,
        technique: Technique,
        image: &[u8],
        encryption_key: &str,
    ) -> Result<ExtractResult> {
        let request = ExtractRequest {
            technique,
            image: codec::encode_bytes(image),
            encryption_key: wire_key(technique, encryption_key),
        };

        info!(
            "📤 Extracting from {} byte image using {}",
            image.len(),
            technique.display_name()
        );

        let (status, reply) = self.dispatch(EXTRACT_PATH, &request).await?;

        let extracted_text = reply
            .extracted_text
            .ok_or_else(|| OrchestratorError::Service {
                status,
                message: "response is missing extracted_text".to_string(),
            })?;

        info!("✅ Extracted {} bytes of text", extracted_text.len());

        Ok(ExtractResult {
            extracted_text,
            message: reply.message,
        })
    }

    /// Sends one POST and returns the reply only when it reports success.
    async fn dispatch<B: Serialize>(&self, path: &str, body: &B) -> Result<(u16, ServiceReply)> {
        let url = self.url(path);
        let body = serde_json::to_string(body)
            .map_err(|e| OrchestratorError::Encode(e.to_string()))?;

        let response = self
            .transport
            .post_json(&url, body, self.config.request_timeout())
            .await
            .map_err(|e| {
                warn!("❌ Cannot reach {}: {}", url, e);
                OrchestratorError::network(e.0)
            })?;

        interpret(response)
    }
}

/// `lsb` never carries a key on the wire.
fn wire_key(technique: Technique, key: &str) -> String {
    if technique.requires_key() {
        key.to_string()
    } else {
        String::new()
    }
}

fn interpret(response: HttpResponse) -> Result<(u16, ServiceReply)> {
    let status = response.status;

    if !response.is_success() {
        let message = response
            .json::<ServiceReply>()
            .ok()
            .and_then(|reply| reply.error)
            .unwrap_or_else(|| status_line(&response));
        warn!("❌ Service answered HTTP {}: {}", status, message);
        return Err(OrchestratorError::Service { status, message });
    }

    let reply: ServiceReply = response.json().map_err(|e| OrchestratorError::Service {
        status,
        message: format!("invalid response from server: {}", e),
    })?;

    if reply.success != Some(true) {
        let message = reply
            .error
            .clone()
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        warn!("❌ Service reported failure: {}", message);
        return Err(OrchestratorError::Service { status, message });
    }

    if let Some(echo) = &reply.technique {
        debug!("Service reports technique '{}'", echo);
    }

    Ok((status, reply))
}

fn status_line(response: &HttpResponse) -> String {
    if response.status_text.is_empty() {
        format!("HTTP error {}", response.status)
    } else {
        format!("HTTP error {}: {}", response.status, response.status_text)
    }
}
