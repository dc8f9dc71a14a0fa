//! # Result Materializer
//!
//! Turns a successful run into something the user can keep:
//! - hide results are saved as PNG under a deterministic filename
//! - extracted text is copied to the system clipboard
//!
//! Filenames look like `cat_AES_2024-01-15T10-30-45-123Z.png`: the original
//! base name (or `stego`), the technique in uppercase and the UTC timestamp in
//! ISO 8601 with millisecond precision where `:` and `.` became `-`.

use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::codec::DisplayableImage;
use crate::common::messages::Technique;
use crate::error::{OrchestratorError, Result};

const FALLBACK_BASE_NAME: &str = "stego";

/// Derives the download filename for a hide result.
pub fn download_filename(
    base_name: Option<&str>,
    technique: Technique,
    at: DateTime<Utc>,
) -> String {
    let base = base_name
        .filter(|b| !b.is_empty())
        .unwrap_or(FALLBACK_BASE_NAME);
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");

    format!("{}_{}_{}.png", base, technique.display_name(), stamp)
}

/// Writes the decoded stego image to `dir/file_name`, creating `dir` if needed.
///
/// # Errors
/// * `Decode` - the stego payload was not valid base64
/// * `Save` - the directory or file could not be written
pub fn save_stego(dir: &Path, file_name: &str, image: &DisplayableImage) -> Result<PathBuf> {
    let bytes = image.require_bytes()?;

    fs::create_dir_all(dir)
        .map_err(|e| OrchestratorError::Save(format!("{}: {}", dir.display(), e)))?;

    let path = dir.join(file_name);
    fs::write(&path, bytes)
        .map_err(|e| OrchestratorError::Save(format!("{}: {}", path.display(), e)))?;

    info!("💾 Saved stego image to {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Destination for copied text.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> std::result::Result<(), String>;
}

/// The desktop clipboard, opened lazily on first copy.
///
/// On Linux, X11 and Wayland clipboards are served by the process that set
/// them and vanish when it exits. A [`SystemClipboard::holding`] clipboard
/// blocks in `set_text` until another application takes ownership, which is
/// what a process about to exit needs. Other platforms keep the text after
/// exit and never block.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
    hold: bool,
}

impl SystemClipboard {
    /// Clipboard for long-lived processes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard that keeps serving copied text until it is replaced.
    pub fn holding() -> Self {
        Self {
            hold: true,
            ..Self::default()
        }
    }

    pub fn holds_until_replaced(&self) -> bool {
        self.hold
    }

    fn open(&mut self) -> std::result::Result<&mut arboard::Clipboard, String> {
        if self.inner.is_none() {
            self.inner = Some(arboard::Clipboard::new().map_err(|e| e.to_string())?);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| "clipboard unavailable".to_string())
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> std::result::Result<(), String> {
        let hold = self.hold;
        let clipboard = self.open()?;
        if hold {
            set_and_hold(clipboard, text)
        } else {
            clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
        }
    }
}

#[cfg(target_os = "linux")]
fn set_and_hold(
    clipboard: &mut arboard::Clipboard,
    text: &str,
) -> std::result::Result<(), String> {
    use arboard::SetExtLinux;

    info!("📋 Serving clipboard until another application takes it over...");
    clipboard
        .set()
        .wait()
        .text(text.to_string())
        .map_err(|e| e.to_string())
}

#[cfg(not(target_os = "linux"))]
fn set_and_hold(
    clipboard: &mut arboard::Clipboard,
    text: &str,
) -> std::result::Result<(), String> {
    clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
}

/// Copies `text`, reporting failure as a non-fatal [`OrchestratorError::Clipboard`].
pub fn copy_text(clipboard: &mut dyn Clipboard, text: &str) -> Result<()> {
    clipboard.set_text(text).map_err(|e| {
        warn!("⚠️  Clipboard copy failed: {}", e);
        OrchestratorError::Clipboard(e)
    })?;
    info!("📋 Copied {} bytes to clipboard", text.len());
    Ok(())
}
