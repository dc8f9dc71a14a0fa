//! # Development Service
//!
//! A local stand-in for the steganography service that speaks the same JSON
//! contract the client expects. It backs the `dev_service` binary and the
//! end-to-end tests.
//!
//! ## Endpoints
//!
//! - `GET  /api/health`
//! - `POST /api/hide`
//! - `POST /api/extract`
//!
//! `lsb` and `xor` are served by [`crate::processing::steganography`]; `aes`
//! is rejected with a 400.

use axum::{
    body::Bytes,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::common::codec;
use crate::common::messages::{HealthReply, ServiceReply, Technique};
use crate::processing::steganography;

/// Largest accepted request body (16 MiB).
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

type Rejection = (StatusCode, Json<ServiceReply>);

/// Request body as sent by any client; every field is optional so missing
/// inputs can be reported with a precise message.
#[derive(Debug, Default, Deserialize)]
struct OperationPayload {
    technique: Option<String>,
    image: Option<String>,
    secret_text: Option<String>,
    encryption_key: Option<String>,
}

/// Inputs that passed the shared checks.
#[derive(Debug)]
struct Checked {
    technique: Technique,
    image: bytes::Bytes,
    secret_text: String,
    encryption_key: String,
}

/// Build the service router.
pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/hide", post(hide_handler))
        .route("/api/extract", post(extract_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}

async fn health_check() -> impl IntoResponse {
    Json(HealthReply {
        status: "healthy".to_string(),
        message: Some("Steganography API is running".to_string()),
    })
}

async fn hide_handler(body: Bytes) -> Result<Json<ServiceReply>, Rejection> {
    let checked = check(&body, true)?;
    let technique = checked.technique;

    info!(
        "📥 Hide request: {} ({} byte image, {} byte text)",
        technique.display_name(),
        checked.image.len(),
        checked.secret_text.len()
    );

    let stego = tokio::task::spawn_blocking(move || {
        steganography::hide_text(
            &checked.image,
            &checked.secret_text,
            checked.technique,
            &checked.encryption_key,
        )
    })
    .await
    .map_err(|e| internal(format!("Processing failed: {}", e)))?
    .map_err(|e| processing_error("Steganography failed", e))?;

    info!("✅ Hide complete: {} byte PNG", stego.len());

    Ok(Json(ServiceReply {
        success: Some(true),
        message: Some("Data hidden successfully".to_string()),
        stego_image: Some(codec::encode_bytes(&stego).into_inner()),
        technique: Some(technique.as_str().to_string()),
        ..Default::default()
    }))
}

async fn extract_handler(body: Bytes) -> Result<Json<ServiceReply>, Rejection> {
    let checked = check(&body, false)?;
    let technique = checked.technique;

    info!(
        "📥 Extract request: {} ({} byte image)",
        technique.display_name(),
        checked.image.len()
    );

    let text = tokio::task::spawn_blocking(move || {
        steganography::extract_text(&checked.image, checked.technique, &checked.encryption_key)
    })
    .await
    .map_err(|e| internal(format!("Extraction failed: {}", e)))?
    .map_err(|e| processing_error("Extraction failed", e))?;

    info!("✅ Extract complete: {} bytes of text", text.len());

    Ok(Json(ServiceReply {
        success: Some(true),
        message: Some("Data extracted successfully".to_string()),
        extracted_text: Some(text),
        technique: Some(technique.as_str().to_string()),
        ..Default::default()
    }))
}

/// Shared input checks, in the order the production service applies them.
fn check(body: &[u8], needs_text: bool) -> Result<Checked, Rejection> {
    let payload: OperationPayload =
        serde_json::from_slice(body).map_err(|_| bad_request("Request must be JSON"))?;

    let technique_name = payload
        .technique
        .unwrap_or_else(|| "lsb".to_string())
        .to_ascii_lowercase();
    let image = payload.image.unwrap_or_default();
    let secret_text = payload.secret_text.unwrap_or_default();
    let encryption_key = payload.encryption_key.unwrap_or_default();

    if image.is_empty() {
        return Err(bad_request("No image provided"));
    }
    if needs_text && secret_text.is_empty() {
        return Err(bad_request("No secret text provided"));
    }
    if technique_name != "lsb" && encryption_key.is_empty() {
        return Err(bad_request("Encryption key required for this technique"));
    }

    let decoded = codec::decode_str(&image);
    let image = match decoded.bytes() {
        Some(bytes) => bytes.clone(),
        None => return Err(bad_request("Invalid image data: payload is not valid base64")),
    };

    let technique: Technique = technique_name
        .parse()
        .map_err(|_| bad_request("Invalid technique specified"))?;

    if technique == Technique::Aes {
        return Err(bad_request("AES technique is not available on this service"));
    }

    Ok(Checked {
        technique,
        image,
        secret_text,
        encryption_key,
    })
}

fn bad_request(message: &str) -> Rejection {
    (StatusCode::BAD_REQUEST, Json(ServiceReply::failure(message)))
}

fn internal(message: String) -> Rejection {
    error!("❌ {}", message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ServiceReply::failure(message)),
    )
}

fn processing_error(context: &str, err: anyhow::Error) -> Rejection {
    internal(format!("{}: {}", context, err))
}
