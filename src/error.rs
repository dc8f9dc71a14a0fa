//! # Error Taxonomy
//!
//! Every fallible operation in the orchestrator reports an [`OrchestratorError`].
//! The variants map one-to-one onto how the workflow reacts:
//!
//! - [`Validation`](OrchestratorError::Validation): local pre-flight check failed, nothing was sent
//! - [`Network`](OrchestratorError::Network): no connection could be established, connectivity flips to disconnected
//! - [`Service`](OrchestratorError::Service): the service answered but reported a failure
//! - [`Decode`](OrchestratorError::Decode): a response carried base64 that does not decode
//! - [`Clipboard`](OrchestratorError::Clipboard): non-fatal, copying extracted text failed

use thiserror::Error;

/// Fixed advisory shown whenever an operation is attempted without a reachable backend.
pub const BACKEND_UNREACHABLE: &str = "backend unreachable";

/// Message carried by [`OrchestratorError::Network`].
pub const CANNOT_CONNECT: &str = "cannot connect to server";

pub const SELECT_IMAGE_FIRST: &str = "select an image first";
pub const ENTER_SECRET_TEXT: &str = "enter secret text";
pub const KEY_REQUIRED: &str = "encryption key required";

/// Fallback when the service reports `success: false` without an `error` field.
pub const GENERIC_FAILURE: &str = "operation failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// A local precondition failed before any request was built.
    #[error("{0}")]
    Validation(String),

    /// The transport could not reach the service at all.
    #[error("{message}")]
    Network { message: String, cause: String },

    /// The service responded with a failure, either via HTTP status or `success: false`.
    #[error("{message}")]
    Service { status: u16, message: String },

    /// A base64 payload from the service could not be decoded.
    #[error("invalid image data in response: {0}")]
    Decode(String),

    /// The image source could not be read for encoding.
    #[error("cannot read image: {0}")]
    Encode(String),

    /// Copying to the system clipboard failed.
    #[error("clipboard copy failed: {0}")]
    Clipboard(String),

    /// Writing a materialized result to disk failed.
    #[error("cannot save image: {0}")]
    Save(String),

    /// A run was requested while another one is still processing.
    #[error("an operation is already in progress")]
    OperationInProgress,
}

impl OrchestratorError {
    pub fn network(cause: impl Into<String>) -> Self {
        OrchestratorError::Network {
            message: CANNOT_CONNECT.to_string(),
            cause: cause.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, OrchestratorError::Network { .. })
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
