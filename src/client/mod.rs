//! # Client Components
//!
//! ## Remote Client ([`client`])
//! Builds health, hide and extract requests, sends each exactly once and
//! normalizes every failure into an [`OrchestratorError`](crate::error::OrchestratorError).
//!
//! ## Transport ([`transport`])
//! The injected HTTP capability the remote client sends through, with the
//! production `reqwest` implementation.

pub mod client;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

// Re-export for convenience
pub use client::{ExtractResult, HideResult, RemoteClient, ServiceStatus};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
