//! # Message Protocol
//!
//! Defines the JSON bodies exchanged with the steganography service and the
//! [`Technique`] identifier shared by both sides.
//!
//! Images travel as standard base64 strings without a `data:` prefix.
//!
//! ```text
//! POST /api/hide     {"technique","image","secret_text","encryption_key"}
//! POST /api/extract  {"technique","image","encryption_key"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::codec::TransferString;

// ============================================================================
// TECHNIQUES
// ============================================================================

/// Steganographic method selected by the user.
///
/// Determines whether an encryption key is needed and which algorithm the
/// service runs. Serialized in lowercase (`"lsb"`, `"xor"`, `"aes"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technique {
    /// Plain least-significant-bit embedding.
    #[default]
    Lsb,
    /// LSB embedding with the payload XOR-ed against a repeating key.
    Xor,
    /// LSB embedding of an AES-encrypted payload.
    Aes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    Medium,
    High,
    Military,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Fast,
    Medium,
    Slow,
}

impl Technique {
    pub const ALL: [Technique; 3] = [Technique::Lsb, Technique::Xor, Technique::Aes];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Lsb => "lsb",
            Technique::Xor => "xor",
            Technique::Aes => "aes",
        }
    }

    /// Uppercase label, also used in download filenames.
    pub fn display_name(&self) -> &'static str {
        match self {
            Technique::Lsb => "LSB",
            Technique::Xor => "XOR",
            Technique::Aes => "AES",
        }
    }

    pub fn security_level(&self) -> SecurityLevel {
        match self {
            Technique::Lsb => SecurityLevel::Medium,
            Technique::Xor => SecurityLevel::High,
            Technique::Aes => SecurityLevel::Military,
        }
    }

    pub fn speed(&self) -> Speed {
        match self {
            Technique::Lsb => Speed::Fast,
            Technique::Xor => Speed::Medium,
            Technique::Aes => Speed::Slow,
        }
    }

    /// `lsb` never needs a key; `xor` and `aes` always do, for hide and extract alike.
    pub fn requires_key(&self) -> bool {
        !matches!(self, Technique::Lsb)
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lsb" => Ok(Technique::Lsb),
            "xor" => Ok(Technique::Xor),
            "aes" => Ok(Technique::Aes),
            other => Err(format!("unknown technique '{}' (expected lsb, xor or aes)", other)),
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SecurityLevel::Medium => "Medium",
            SecurityLevel::High => "High",
            SecurityLevel::Military => "Military",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Speed::Fast => "Fast",
            Speed::Medium => "Medium",
            Speed::Slow => "Slow",
        };
        f.write_str(label)
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

/// **Hide Request**
///
/// # Fields
/// - `technique`: Method the service should use
/// - `image`: Cover image as a base64 transfer string
/// - `secret_text`: Text to embed
/// - `encryption_key`: Key for `xor`/`aes`, empty string for `lsb`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HideRequest {
    pub technique: Technique,
    pub image: TransferString,
    pub secret_text: String,
    pub encryption_key: String,
}

/// **Extract Request**
///
/// Same shape as [`HideRequest`] without the secret text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractRequest {
    pub technique: Technique,
    pub image: TransferString,
    pub encryption_key: String,
}

// ============================================================================
// RESPONSES
// ============================================================================

/// **Service Reply**
///
/// The service answers every operation with a single loosely-typed object.
/// Fields that do not apply to an operation are simply absent.
///
/// # Fields
/// - `success`: `true` when the operation completed
/// - `error`: Failure reason, present on `success: false` and on non-2xx replies
/// - `message`: Informational text
/// - `stego_image`: Hide result as base64
/// - `extracted_text`: Extract result
/// - `technique`: Echo of the technique used, informational only and kept as sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stego_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
}

impl ServiceReply {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReply {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
