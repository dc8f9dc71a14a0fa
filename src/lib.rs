pub mod client;
pub mod common;
pub mod error;
pub mod processing;
pub mod service;
pub mod workflow;

pub use client::{RemoteClient, ReqwestTransport};
pub use common::messages::Technique;
pub use error::OrchestratorError;
pub use workflow::Orchestrator;
