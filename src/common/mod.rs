//! # Common Components
//!
//! Shared utilities and data structures used by the client, the workflow and
//! the development service.
//!
//! ## Modules
//!
//! - [`messages`]: JSON request/response bodies and the [`Technique`](messages::Technique) identifier
//! - [`codec`]: base64 transfer codec for image payloads
//! - [`config`]: Configuration parsing utilities
//! - [`logging`]: Logger initialization for the binaries

pub mod codec;
pub mod config;
pub mod logging;
pub mod messages;
