//! # Transfer Codec
//!
//! Converts binary images to and from the wire representation used by the
//! steganography service: standard base64 (with padding) of the raw file
//! bytes, without any `data:` media-type prefix.
//!
//! Decoding never fails hard. A malformed payload becomes a *broken*
//! [`DisplayableImage`] which renders as a broken image, the same way a
//! browser treats a bad `data:` URI.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::{OrchestratorError, Result};

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Base64 text representation of an image as it travels on the wire.
#[derive(Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TransferString(String);

impl TransferString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for TransferString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransferString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// Payloads can be megabytes long; keep Debug output readable.
impl fmt::Debug for TransferString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransferString({} chars)", self.0.len())
    }
}

/// An image ready for display or download.
///
/// Clones are cheap: decoded images share their [`Bytes`], broken ones share
/// the raw payload. The base64 form for a `data:` URI is produced on demand.
#[derive(Clone, PartialEq, Eq)]
pub struct DisplayableImage {
    content: Content,
}

#[derive(Clone, PartialEq, Eq)]
enum Content {
    Decoded(Bytes),
    /// Payload that was not valid base64, kept as received.
    Broken(Arc<str>),
}

impl DisplayableImage {
    /// Builds a displayable image straight from raw bytes, e.g. for a local preview.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            content: Content::Decoded(bytes),
        }
    }

    /// `data:image/png;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("{}{}", DATA_URI_PREFIX, self.payload())
    }

    /// Base64 payload without any prefix.
    pub fn payload(&self) -> Cow<'_, str> {
        match &self.content {
            Content::Decoded(bytes) => Cow::Owned(general_purpose::STANDARD.encode(bytes)),
            Content::Broken(raw) => Cow::Borrowed(&**raw),
        }
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.content {
            Content::Decoded(bytes) => Some(bytes),
            Content::Broken(_) => None,
        }
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.content, Content::Broken(_))
    }

    /// Decoded bytes, or a [`OrchestratorError::Decode`] for a broken image.
    pub fn require_bytes(&self) -> Result<&Bytes> {
        match &self.content {
            Content::Decoded(bytes) => Ok(bytes),
            Content::Broken(raw) => Err(OrchestratorError::Decode(format!(
                "payload of {} chars is not valid base64",
                raw.len()
            ))),
        }
    }
}

impl fmt::Debug for DisplayableImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            Content::Decoded(bytes) => f
                .debug_struct("DisplayableImage")
                .field("bytes", &bytes.len())
                .finish(),
            Content::Broken(raw) => f
                .debug_struct("DisplayableImage")
                .field("broken_payload_chars", &raw.len())
                .finish(),
        }
    }
}

/// Encode an in-memory image.
pub fn encode_bytes(image: &[u8]) -> TransferString {
    TransferString(general_purpose::STANDARD.encode(image))
}

/// Encode everything readable from `source`.
///
/// # Errors
/// [`OrchestratorError::Encode`] if the source cannot be read to the end.
pub fn encode<R: Read>(source: &mut R) -> Result<TransferString> {
    let mut buf = Vec::new();
    source
        .read_to_end(&mut buf)
        .map_err(|e| OrchestratorError::Encode(e.to_string()))?;
    Ok(encode_bytes(&buf))
}

/// Open and encode a file.
pub fn encode_file<P: AsRef<Path>>(path: P) -> Result<TransferString> {
    let path = path.as_ref();
    let mut file = File::open(path)
        .map_err(|e| OrchestratorError::Encode(format!("{}: {}", path.display(), e)))?;
    encode(&mut file)
}

/// Wrap a transfer string into a displayable image.
///
/// A leading `data:<type>;base64,` prefix is tolerated and stripped.
pub fn decode(transfer: &TransferString) -> DisplayableImage {
    decode_str(transfer.as_str())
}

pub fn decode_str(payload: &str) -> DisplayableImage {
    let payload = strip_data_uri(payload);
    let content = match general_purpose::STANDARD.decode(payload) {
        Ok(bytes) => Content::Decoded(Bytes::from(bytes)),
        Err(_) => Content::Broken(Arc::from(payload)),
    };

    DisplayableImage { content }
}

fn strip_data_uri(payload: &str) -> &str {
    match payload.find("base64,") {
        Some(idx) if payload.starts_with("data:") => &payload[idx + "base64,".len()..],
        _ => payload,
    }
}
