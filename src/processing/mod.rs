//! # Image Processing and Steganography
//!
//! LSB and XOR-keyed LSB text embedding used by the development service.

pub mod steganography;

// Re-export main functions for convenience
pub use steganography::{extract_text, hide_text};
