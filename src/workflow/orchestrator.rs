//! # Workflow Orchestrator
//!
//! Drives a [`Session`] against a [`RemoteClient`]: it forwards user actions
//! to the session, performs the network call a validated run asks for, and
//! feeds the outcome back.
//!
//! ## Request Workflow
//!
//! 1. **Probe**: `start()` runs the connectivity check once per visit
//! 2. **Validate**: `run()` asks the session for a [`PendingOperation`]
//! 3. **Dispatch**: the matching hide/extract call is made, exactly once
//! 4. **Absorb**: the outcome goes back to the session under the run's ticket
//!
//! Observers get every state change through [`Orchestrator::subscribe`].
//!
//! ## Sharing
//!
//! The session lives inside the `watch` channel that publishes it. Every
//! action takes `&self`, mutates the session under the channel's lock and
//! releases it before any network await, so inputs can be edited while the
//! probe is pending and `reset()` or a mode change can land while a run is in
//! flight. The outcome of a run that was overtaken that way is dropped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = RemoteClient::new(config.service.clone(), ReqwestTransport::new()?);
//! let orchestrator = Orchestrator::new(client);
//!
//! orchestrator.start().await;
//! orchestrator.set_technique(Technique::Aes);
//! orchestrator.select_image(CoverImage::open("cat.png")?);
//! orchestrator.set_secret_text("HELLO");
//! orchestrator.set_encryption_key("s3cret");
//! orchestrator.run().await;
//! ```

use chrono::{DateTime, Utc};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use crate::client::client::RemoteClient;
use crate::client::transport::HttpTransport;
use crate::common::messages::Technique;
use crate::error::{OrchestratorError, Result};
use crate::workflow::materialize::{self, Clipboard};
use crate::workflow::monitor;
use crate::workflow::session::{
    Connectivity, CoverImage, Mode, OperationOutcome, OperationRequest, OperationResult, Phase,
    Session,
};

/// Handle on one session and the client it talks through.
///
/// Clones share the same session and client.
pub struct Orchestrator<T: HttpTransport> {
    client: Arc<RemoteClient<T>>,
    state: Arc<watch::Sender<Session>>,
}

impl<T: HttpTransport> Clone for Orchestrator<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: HttpTransport> Orchestrator<T> {
    pub fn new(client: RemoteClient<T>) -> Self {
        let (state, _) = watch::channel(Session::new());
        Self {
            client: Arc::new(client),
            state: Arc::new(state),
        }
    }

    /// Current session. Keep the guard short-lived: actions wait for it.
    pub fn session(&self) -> watch::Ref<'_, Session> {
        self.state.borrow()
    }

    /// Receives a notification after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Session start: probe the service once.
    ///
    /// Inputs may be collected while this is pending; only `run()` needs it.
    pub async fn start(&self) -> Connectivity {
        self.state.send_modify(Session::begin_connectivity_check);

        let status = monitor::check(&self.client).await;

        self.state
            .send_modify(|session| session.apply_connectivity(status));
        self.state.borrow().connectivity()
    }

    pub fn set_mode(&self, mode: Mode) {
        self.state.send_modify(|session| session.set_mode(mode));
    }

    pub fn set_technique(&self, technique: Technique) {
        self.state
            .send_modify(|session| session.set_technique(technique));
    }

    pub fn reset(&self) {
        self.state.send_modify(Session::reset);
    }

    pub fn select_image(&self, image: CoverImage) -> bool {
        self.state
            .send_if_modified(|session| session.select_image(image))
    }

    pub fn clear_image(&self) -> bool {
        self.state.send_if_modified(Session::clear_image)
    }

    pub fn set_secret_text(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.state
            .send_if_modified(|session| session.set_secret_text(text))
    }

    pub fn set_encryption_key(&self, key: impl Into<String>) -> bool {
        let key = key.into();
        self.state
            .send_if_modified(|session| session.set_encryption_key(key))
    }

    /// Runs the active operation and returns the phase the session is in
    /// once the call has resolved.
    ///
    /// Validation failures never reach the network; the session carries the
    /// message in `error_message` either way. A run requested while another
    /// one is processing makes no call and leaves the session untouched.
    pub async fn run(&self) -> Phase {
        let mut begun = Err(OrchestratorError::OperationInProgress);
        self.state.send_if_modified(|session| {
            begun = session.begin_run();
            !matches!(begun, Err(OrchestratorError::OperationInProgress))
        });

        let pending = match begun {
            Ok(pending) => pending,
            Err(_) => return self.state.borrow().phase(),
        };

        let id = self.state.borrow().id();

        let outcome = match pending.request {
            OperationRequest::Hide {
                technique,
                image,
                secret_text,
                encryption_key,
            } => {
                info!("Session {} dispatching hide with {}", id, technique.display_name());
                self.client
                    .hide(technique, &image, &secret_text, &encryption_key)
                    .await
                    .map(OperationOutcome::Hidden)
            }
            OperationRequest::Extract {
                technique,
                image,
                encryption_key,
            } => {
                info!("Session {} dispatching extract with {}", id, technique.display_name());
                self.client
                    .extract(technique, &image, &encryption_key)
                    .await
                    .map(OperationOutcome::Extracted)
            }
        };

        let ticket = pending.ticket;
        self.state
            .send_if_modified(|session| session.complete(ticket, outcome));
        self.state.borrow().phase()
    }

    /// Filename the current hide result would be saved under.
    pub fn download_filename(&self, at: DateTime<Utc>) -> Option<String> {
        match self.state.borrow().result() {
            Some(OperationResult::Stego {
                base_name,
                technique,
                ..
            }) => Some(materialize::download_filename(
                base_name.as_deref(),
                *technique,
                at,
            )),
            _ => None,
        }
    }

    /// Saves the current hide result into `dir`.
    pub fn save_stego(&self, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf> {
        let result = self.state.borrow().result().cloned();
        match result {
            Some(OperationResult::Stego {
                image,
                base_name,
                technique,
            }) => {
                let file_name =
                    materialize::download_filename(base_name.as_deref(), technique, at);
                materialize::save_stego(dir, &file_name, &image)
            }
            _ => Err(OrchestratorError::Save("no stego image to save".to_string())),
        }
    }

    /// Copies the extracted text. Failure is reported but leaves the phase alone.
    pub fn copy_extracted(&self, clipboard: &mut dyn Clipboard) -> Result<()> {
        let text = self.state.borrow().extracted_text().map(str::to_string);
        match text {
            Some(text) => materialize::copy_text(clipboard, &text),
            None => Err(OrchestratorError::Clipboard(
                "no extracted text to copy".to_string(),
            )),
        }
    }
}
