//! # Workflow
//!
//! The user-facing side of the orchestrator.
//!
//! ## Session ([`session`])
//! Inspectable value object holding mode, technique, inputs, connectivity,
//! phase and result, with every transition as a method.
//!
//! ## Orchestrator ([`orchestrator`])
//! Pairs a session with a remote client, performs the calls the session asks
//! for and publishes snapshots to subscribers.
//!
//! ## Connectivity Monitor ([`monitor`])
//! One-shot health probe at session start.
//!
//! ## Result Materializer ([`materialize`])
//! Download filenames, saving stego images, clipboard export.

pub mod materialize;
pub mod monitor;
pub mod orchestrator;
pub mod session;

pub use orchestrator::Orchestrator;
pub use session::{Connectivity, CoverImage, Mode, OperationResult, Phase, Session};
