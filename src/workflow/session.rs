//! # Workflow Session
//!
//! The complete, inspectable state of one tool visit and every transition it
//! can take. The session performs no I/O: it validates, hands out a
//! [`PendingOperation`] describing the call to make, and later absorbs the
//! outcome through [`Session::complete`].
//!
//! ## Phases
//!
//! ```text
//!            begin_run (valid)           complete(Ok)
//!   Idle ───────────────────► Processing ───────────► Success
//!    ▲  ╲                         │
//!    │   ╲ begin_run (invalid)    │ complete(Err)
//!    │    ╲──────────────────► Error ◄┘
//!    │                           │
//!    └── reset / mode / technique / input edit
//! ```
//!
//! ## Generations
//!
//! Every run and every reset bumps `generation`. A [`Ticket`] remembers the
//! generation its run started in; an outcome whose ticket is stale is dropped.

use bytes::Bytes;
use log::{debug, info};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::client::client::{ExtractResult, HideResult, ServiceStatus};
use crate::common::codec::DisplayableImage;
use crate::common::messages::Technique;
use crate::error::{
    OrchestratorError, Result, BACKEND_UNREACHABLE, ENTER_SECRET_TEXT, KEY_REQUIRED,
    SELECT_IMAGE_FIRST,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Hide,
    Extract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Checking,
    Connected,
    Disconnected,
}

impl From<ServiceStatus> for Connectivity {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Connected => Connectivity::Connected,
            ServiceStatus::Disconnected => Connectivity::Disconnected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

/// The image selected by the user, with its preview and original filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    file_name: String,
    bytes: Bytes,
    preview: DisplayableImage,
}

impl CoverImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            file_name: file_name.into(),
            preview: DisplayableImage::from_bytes(bytes.clone()),
            bytes,
        }
    }

    /// Reads an image file from disk.
    ///
    /// # Errors
    /// [`OrchestratorError::Encode`] when the file cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| OrchestratorError::Encode(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Filename without its final extension, `None` when nothing is left.
    pub fn base_name(&self) -> Option<&str> {
        let stem = match self.file_name.rfind('.') {
            Some(idx) => &self.file_name[..idx],
            None => self.file_name.as_str(),
        };
        if stem.is_empty() {
            None
        } else {
            Some(stem)
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn preview(&self) -> &DisplayableImage {
        &self.preview
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Hide output plus what the download name is derived from.
    Stego {
        image: DisplayableImage,
        base_name: Option<String>,
        technique: Technique,
    },
    /// Extract output.
    Text(String),
}

/// Identifies the run an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// The network call a validated run asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    Hide {
        technique: Technique,
        image: Bytes,
        secret_text: String,
        encryption_key: String,
    },
    Extract {
        technique: Technique,
        image: Bytes,
        encryption_key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub ticket: Ticket,
    pub request: OperationRequest,
}

/// Successful remote result, before it is absorbed into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Hidden(HideResult),
    Extracted(ExtractResult),
}

/// Mutable state of one workflow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: Uuid,
    mode: Mode,
    technique: Technique,
    cover: Option<CoverImage>,
    secret_text: String,
    encryption_key: String,
    connectivity: Connectivity,
    phase: Phase,
    result: Option<OperationResult>,
    error_message: Option<String>,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: Mode::default(),
            technique: Technique::default(),
            cover: None,
            secret_text: String::new(),
            encryption_key: String::new(),
            connectivity: Connectivity::Checking,
            phase: Phase::Idle,
            result: None,
            error_message: None,
            generation: 0,
        }
    }

    // ========== ACCESSORS ==========

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn technique(&self) -> Technique {
        self.technique
    }

    pub fn cover_image(&self) -> Option<&CoverImage> {
        self.cover.as_ref()
    }

    pub fn secret_text(&self) -> &str {
        &self.secret_text
    }

    pub fn encryption_key(&self) -> &str {
        &self.encryption_key
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<&OperationResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn extracted_text(&self) -> Option<&str> {
        match &self.result {
            Some(OperationResult::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Whether the "run" affordance is enabled.
    pub fn can_run(&self) -> bool {
        self.phase != Phase::Processing
    }

    // ========== SELECTION ==========

    /// Switches between hide and extract. Always clears transient state.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset_transient();
    }

    /// Selects a technique. Always clears transient state.
    pub fn set_technique(&mut self, technique: Technique) {
        self.technique = technique;
        self.reset_transient();
    }

    /// Explicit user reset back to `Idle`.
    pub fn reset(&mut self) {
        self.reset_transient();
    }

    /// The single reset path: drops image, text, key, result and error, returns
    /// to `Idle` and invalidates any outstanding run.
    fn reset_transient(&mut self) {
        self.release_cover();
        self.secret_text.clear();
        self.encryption_key.clear();
        self.result = None;
        self.error_message = None;
        self.phase = Phase::Idle;
        self.generation += 1;
    }

    fn release_cover(&mut self) {
        if let Some(previous) = self.cover.take() {
            debug!(
                "Session {} released preview of '{}'",
                self.id,
                previous.file_name()
            );
        }
    }

    // ========== INPUTS ==========
    //
    // Edits are ignored while a run is processing. Otherwise an edit leaves a
    // terminal Success/Error phase and returns to Idle.

    /// Replaces the selected image, releasing the previous preview.
    pub fn select_image(&mut self, image: CoverImage) -> bool {
        if !self.accept_edit() {
            return false;
        }
        self.release_cover();
        self.cover = Some(image);
        true
    }

    pub fn clear_image(&mut self) -> bool {
        if !self.accept_edit() {
            return false;
        }
        self.release_cover();
        true
    }

    pub fn set_secret_text(&mut self, text: impl Into<String>) -> bool {
        if !self.accept_edit() {
            return false;
        }
        self.secret_text = text.into();
        true
    }

    pub fn set_encryption_key(&mut self, key: impl Into<String>) -> bool {
        if !self.accept_edit() {
            return false;
        }
        self.encryption_key = key.into();
        true
    }

    fn accept_edit(&mut self) -> bool {
        match self.phase {
            Phase::Processing => false,
            Phase::Success | Phase::Error => {
                self.phase = Phase::Idle;
                self.result = None;
                self.error_message = None;
                true
            }
            Phase::Idle => true,
        }
    }

    // ========== CONNECTIVITY ==========

    pub fn begin_connectivity_check(&mut self) {
        self.connectivity = Connectivity::Checking;
    }

    pub fn apply_connectivity(&mut self, status: ServiceStatus) {
        self.connectivity = status.into();
        info!("Session {} connectivity: {:?}", self.id, self.connectivity);
    }

    // ========== RUN ==========

    /// Guard checks in fixed order, first failure wins.
    fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.connectivity != Connectivity::Connected {
            return Err(BACKEND_UNREACHABLE);
        }
        if self.cover.is_none() {
            return Err(SELECT_IMAGE_FIRST);
        }
        if self.mode == Mode::Hide && self.secret_text.is_empty() {
            return Err(ENTER_SECRET_TEXT);
        }
        if self.technique.requires_key() && self.encryption_key.is_empty() {
            return Err(KEY_REQUIRED);
        }
        Ok(())
    }

    /// Attempts `Idle/Success/Error → Processing`.
    ///
    /// # Errors
    ///
    /// * `OperationInProgress` - a run is already processing; state untouched
    /// * `Validation` - a guard failed; phase becomes `Error` with the message
    pub fn begin_run(&mut self) -> Result<PendingOperation> {
        if self.phase == Phase::Processing {
            return Err(OrchestratorError::OperationInProgress);
        }

        if let Err(message) = self.validate() {
            info!("Session {} run refused: {}", self.id, message);
            self.phase = Phase::Error;
            self.result = None;
            self.error_message = Some(message.to_string());
            return Err(OrchestratorError::Validation(message.to_string()));
        }

        let image = match &self.cover {
            Some(cover) => cover.bytes().clone(),
            None => return Err(OrchestratorError::Validation(SELECT_IMAGE_FIRST.to_string())),
        };

        let request = match self.mode {
            Mode::Hide => OperationRequest::Hide {
                technique: self.technique,
                image,
                secret_text: self.secret_text.clone(),
                encryption_key: self.encryption_key.clone(),
            },
            Mode::Extract => OperationRequest::Extract {
                technique: self.technique,
                image,
                encryption_key: self.encryption_key.clone(),
            },
        };

        self.generation += 1;
        self.phase = Phase::Processing;
        self.result = None;
        self.error_message = None;

        Ok(PendingOperation {
            ticket: Ticket(self.generation),
            request,
        })
    }

    /// Absorbs the outcome of a run.
    ///
    /// Returns `false` and leaves the session untouched when the ticket is
    /// obsolete, i.e. a reset or another run happened since it was issued.
    pub fn complete(&mut self, ticket: Ticket, outcome: Result<OperationOutcome>) -> bool {
        if self.phase != Phase::Processing || ticket.0 != self.generation {
            debug!(
                "Session {} discarded obsolete outcome (ticket {}, generation {})",
                self.id, ticket.0, self.generation
            );
            return false;
        }

        match outcome {
            Ok(OperationOutcome::Hidden(hidden)) => {
                self.result = Some(OperationResult::Stego {
                    image: hidden.stego_image,
                    base_name: self
                        .cover
                        .as_ref()
                        .and_then(|c| c.base_name())
                        .map(str::to_string),
                    technique: self.technique,
                });
                self.phase = Phase::Success;
            }
            Ok(OperationOutcome::Extracted(extracted)) => {
                self.result = Some(OperationResult::Text(extracted.extracted_text));
                self.phase = Phase::Success;
            }
            Err(err) => {
                if err.is_network() {
                    self.connectivity = Connectivity::Disconnected;
                }
                self.error_message = Some(err.to_string());
                self.phase = Phase::Error;
            }
        }

        info!("Session {} run finished: {:?}", self.id, self.phase);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::codec;

    fn connected() -> Session {
        let mut session = Session::new();
        session.apply_connectivity(ServiceStatus::Connected);
        session
    }

    fn png() -> CoverImage {
        CoverImage::new("cat.png", vec![0x89, b'P', b'N', b'G'])
    }

    fn extracted(text: &str) -> Result<OperationOutcome> {
        Ok(OperationOutcome::Extracted(ExtractResult {
            extracted_text: text.to_string(),
            message: None,
        }))
    }

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new();
        assert_eq!(session.mode(), Mode::Hide);
        assert_eq!(session.technique(), Technique::Lsb);
        assert_eq!(session.connectivity(), Connectivity::Checking);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.can_run());
    }

    #[test]
    fn test_base_name() {
        assert_eq!(png().base_name(), Some("cat"));
        assert_eq!(CoverImage::new("a.b.jpeg", Vec::<u8>::new()).base_name(), Some("a.b"));
        assert_eq!(CoverImage::new("noext", Vec::<u8>::new()).base_name(), Some("noext"));
        assert_eq!(CoverImage::new(".png", Vec::<u8>::new()).base_name(), None);
        assert_eq!(CoverImage::new("", Vec::<u8>::new()).base_name(), None);
    }

    #[test]
    fn test_validation_order() {
        let mut session = Session::new();
        session.set_technique(Technique::Aes);

        // Checking counts as not connected.
        let err = session.begin_run().unwrap_err();
        assert_eq!(err, OrchestratorError::Validation(BACKEND_UNREACHABLE.to_string()));

        session.apply_connectivity(ServiceStatus::Connected);
        assert_eq!(session.begin_run().unwrap_err().to_string(), SELECT_IMAGE_FIRST);

        session.select_image(png());
        assert_eq!(session.begin_run().unwrap_err().to_string(), ENTER_SECRET_TEXT);

        session.set_secret_text("HELLO");
        assert_eq!(session.begin_run().unwrap_err().to_string(), KEY_REQUIRED);
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.error_message(), Some(KEY_REQUIRED));

        session.set_encryption_key("k");
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.error_message().is_none());
        assert!(session.begin_run().is_ok());
        assert_eq!(session.phase(), Phase::Processing);
    }

    #[test]
    fn test_keyed_techniques_require_key_in_both_modes() {
        for technique in [Technique::Xor, Technique::Aes] {
            for mode in [Mode::Hide, Mode::Extract] {
                let mut session = connected();
                session.set_mode(mode);
                session.set_technique(technique);
                session.select_image(png());
                session.set_secret_text("HELLO");

                let err = session.begin_run().unwrap_err();
                assert_eq!(err, OrchestratorError::Validation(KEY_REQUIRED.to_string()));
            }
        }
    }

    #[test]
    fn test_lsb_runs_without_key() {
        let mut session = connected();
        session.set_mode(Mode::Extract);
        session.select_image(png());

        let pending = session.begin_run().unwrap();
        match pending.request {
            OperationRequest::Extract {
                technique,
                encryption_key,
                ..
            } => {
                assert_eq!(technique, Technique::Lsb);
                assert!(encryption_key.is_empty());
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_extract_does_not_need_secret_text() {
        let mut session = connected();
        session.set_mode(Mode::Extract);
        session.set_technique(Technique::Xor);
        session.select_image(png());
        session.set_encryption_key("k");
        assert!(session.begin_run().is_ok());
    }

    #[test]
    fn test_mode_and_technique_changes_reset_everything() {
        let mut session = connected();
        session.set_technique(Technique::Xor);
        session.select_image(png());
        session.set_secret_text("HELLO");
        session.set_encryption_key("k");
        let pending = session.begin_run().unwrap();
        session.complete(
            pending.ticket,
            Ok(OperationOutcome::Hidden(HideResult {
                stego_image: codec::decode_str("c3RlZ28="),
                message: None,
            })),
        );
        assert!(session.result().is_some());

        session.set_technique(Technique::Aes);
        assert!(session.cover_image().is_none());
        assert!(session.secret_text().is_empty());
        assert!(session.encryption_key().is_empty());
        assert!(session.result().is_none());
        assert!(session.error_message().is_none());
        assert_eq!(session.phase(), Phase::Idle);
        // Connectivity survives a reset.
        assert_eq!(session.connectivity(), Connectivity::Connected);

        session.select_image(png());
        session.set_secret_text("again");
        session.begin_run().unwrap_err();
        assert_eq!(session.error_message(), Some(KEY_REQUIRED));

        session.set_mode(Mode::Extract);
        assert!(session.cover_image().is_none());
        assert!(session.secret_text().is_empty());
        assert!(session.error_message().is_none());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = connected();
        session.select_image(png());
        session.set_secret_text("HELLO");

        session.set_mode(Mode::Hide);
        let once = session.clone();
        session.set_mode(Mode::Hide);

        assert_eq!(session.cover_image(), once.cover_image());
        assert_eq!(session.secret_text(), once.secret_text());
        assert_eq!(session.encryption_key(), once.encryption_key());
        assert_eq!(session.result(), once.result());
        assert_eq!(session.error_message(), once.error_message());
        assert_eq!(session.phase(), once.phase());
    }

    #[test]
    fn test_second_run_rejected_while_processing() {
        let mut session = connected();
        session.set_mode(Mode::Extract);
        session.select_image(png());

        let pending = session.begin_run().unwrap();
        assert!(!session.can_run());

        let before = session.clone();
        assert_eq!(session.begin_run(), Err(OrchestratorError::OperationInProgress));
        assert_eq!(session, before);

        // Inputs are frozen too.
        assert!(!session.set_encryption_key("late"));
        assert!(!session.clear_image());

        assert!(session.complete(pending.ticket, extracted("HELLO")));
        assert_eq!(session.phase(), Phase::Success);
        assert_eq!(session.extracted_text(), Some("HELLO"));
        assert!(session.can_run());
    }

    #[test]
    fn test_late_response_after_reset_is_discarded() {
        let mut session = connected();
        session.set_mode(Mode::Extract);
        session.select_image(png());
        let pending = session.begin_run().unwrap();

        session.set_technique(Technique::Lsb);
        assert_eq!(session.phase(), Phase::Idle);

        assert!(!session.complete(pending.ticket, extracted("stale")));
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.result().is_none());
    }

    #[test]
    fn test_ticket_from_older_run_is_discarded() {
        let mut session = connected();
        session.set_mode(Mode::Extract);
        session.select_image(png());

        let first = session.begin_run().unwrap();
        assert!(session.complete(first.ticket, extracted("one")));

        session.set_encryption_key("");
        let second = session.begin_run().unwrap();
        assert!(!session.complete(first.ticket, extracted("one again")));
        assert_eq!(session.phase(), Phase::Processing);
        assert!(session.complete(second.ticket, extracted("two")));
        assert_eq!(session.extracted_text(), Some("two"));
    }

    #[test]
    fn test_network_failure_disconnects() {
        let mut session = connected();
        session.select_image(png());
        session.set_secret_text("HELLO");
        let pending = session.begin_run().unwrap();

        session.complete(pending.ticket, Err(OrchestratorError::network("refused")));
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.connectivity(), Connectivity::Disconnected);
        assert_eq!(session.error_message(), Some("cannot connect to server"));

        // Subsequent attempts are blocked locally.
        assert_eq!(
            session.begin_run().unwrap_err().to_string(),
            BACKEND_UNREACHABLE
        );
    }

    #[test]
    fn test_service_failure_keeps_connectivity() {
        let mut session = connected();
        session.select_image(png());
        session.set_secret_text("HELLO");
        let pending = session.begin_run().unwrap();

        session.complete(
            pending.ticket,
            Err(OrchestratorError::Service {
                status: 500,
                message: "Processing failed: image too small".to_string(),
            }),
        );
        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.connectivity(), Connectivity::Connected);
        assert_eq!(
            session.error_message(),
            Some("Processing failed: image too small")
        );
    }

    #[test]
    fn test_hide_success_records_download_inputs() {
        let mut session = connected();
        session.set_technique(Technique::Xor);
        session.select_image(png());
        session.set_secret_text("HELLO");
        session.set_encryption_key("k");
        let pending = session.begin_run().unwrap();

        let stego = codec::decode_str("c3RlZ28=");
        session.complete(
            pending.ticket,
            Ok(OperationOutcome::Hidden(HideResult {
                stego_image: stego.clone(),
                message: None,
            })),
        );

        assert_eq!(
            session.result(),
            Some(&OperationResult::Stego {
                image: stego,
                base_name: Some("cat".to_string()),
                technique: Technique::Xor,
            })
        );
    }

    #[test]
    fn test_replacing_image_keeps_only_latest() {
        let mut session = Session::new();
        session.select_image(png());
        session.select_image(CoverImage::new("dog.jpg", vec![1u8, 2, 3]));
        assert_eq!(session.cover_image().unwrap().file_name(), "dog.jpg");

        session.clear_image();
        assert!(session.cover_image().is_none());
    }

    #[test]
    fn test_open_missing_file() {
        let err = CoverImage::open("/no/such/cover.png").unwrap_err();
        assert!(matches!(err, OrchestratorError::Encode(_)));
    }
}
