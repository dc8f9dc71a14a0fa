//! # LSB Steganography Implementation
//!
//! Text embedding and extraction for the development service.
//!
//! ## Algorithm
//!
//! The payload is `[4 bytes length, big-endian][text bytes]`. Each bit, MSB
//! first, replaces the least significant bit of the next color channel,
//! walking R → G → B → next pixel in row-major order. Alpha is left alone.
//!
//! For `xor` the whole payload, length prefix included, is XOR-ed with the key
//! repeated end to end before embedding.
//!
//! ### Capacity
//! An image can store `(width * height * 3) / 8` bytes, 4 of which are the
//! length prefix. Example: an 800x600 image holds ~180 KB of text.

use anyhow::{anyhow, bail, Result};
use image::RgbaImage;

use crate::common::messages::Technique;

const LENGTH_PREFIX: usize = 4;

/// Usable payload bytes of an image, length prefix excluded.
pub fn capacity(width: u32, height: u32) -> usize {
    let total = (width as usize * height as usize * 3) / 8;
    total.saturating_sub(LENGTH_PREFIX)
}

/// Hide `text` in `image_bytes` and return the stego image as PNG.
///
/// # Errors
/// - `aes` is requested (not provided by this service)
/// - `xor` without a key
/// - Image format is invalid or too small for the text
pub fn hide_text(image_bytes: &[u8], text: &str, technique: Technique, key: &str) -> Result<Vec<u8>> {
    let key = key_for(technique, key)?;

    let img = image::load_from_memory(image_bytes)?;
    let mut img = img.to_rgba8();

    // Prepare data to embed: [4 bytes length][text bytes]
    let text_bytes = text.as_bytes();
    let length = u32::try_from(text_bytes.len()).map_err(|_| anyhow!("text too long"))?;
    let mut data = Vec::with_capacity(LENGTH_PREFIX + text_bytes.len());
    data.extend_from_slice(&length.to_be_bytes());
    data.extend_from_slice(text_bytes);

    if let Some(key) = key {
        xor_keystream(&mut data, key, 0);
    }

    embed_bits(&mut img, &data)?;

    let mut output_bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut output_bytes),
        image::ImageFormat::Png,
    )?;

    Ok(output_bytes)
}

/// Extract text hidden by [`hide_text`].
///
/// # Errors
/// - Image format is invalid
/// - The decoded length prefix exceeds the image capacity (no message, or wrong key)
/// - Extracted bytes are not valid UTF-8
pub fn extract_text(image_bytes: &[u8], technique: Technique, key: &str) -> Result<String> {
    let key = key_for(technique, key)?;

    let img = image::load_from_memory(image_bytes)?.to_rgba8();
    let (width, height) = img.dimensions();
    let mut bits = lsb_stream(&img);

    // ========== STEP 1: Extract length (first 4 bytes = 32 bits) ==========

    let mut header =
        read_bytes(&mut bits, LENGTH_PREFIX).ok_or_else(|| anyhow!("Image too small"))?;
    if let Some(key) = key {
        xor_keystream(&mut header, key, 0);
    }

    let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    if length > capacity(width, height) {
        bail!(
            "No hidden message found: declared length {} exceeds capacity {}",
            length,
            capacity(width, height)
        );
    }

    // ========== STEP 2: Extract text data ==========

    let mut text_bytes =
        read_bytes(&mut bits, length).ok_or_else(|| anyhow!("Hidden message is truncated"))?;
    if let Some(key) = key {
        xor_keystream(&mut text_bytes, key, LENGTH_PREFIX);
    }

    Ok(String::from_utf8(text_bytes)?)
}

fn key_for(technique: Technique, key: &str) -> Result<Option<&[u8]>> {
    match technique {
        Technique::Lsb => Ok(None),
        Technique::Xor if key.is_empty() => bail!("Encryption key required for this technique"),
        Technique::Xor => Ok(Some(key.as_bytes())),
        Technique::Aes => bail!("AES technique is not available on this service"),
    }
}

/// XOR `data` with `key` repeated, starting at key position `offset`.
fn xor_keystream(data: &mut [u8], key: &[u8], offset: usize) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[(offset + i) % key.len()];
    }
}

fn embed_bits(img: &mut RgbaImage, data: &[u8]) -> Result<()> {
    let (width, height) = img.dimensions();

    // Each pixel has 3 usable channels (R, G, B), so 3 bits per pixel
    let available_bits = width as usize * height as usize * 3;
    let required_bits = data.len() * 8;

    if required_bits > available_bits {
        bail!(
            "Image too small for this text: need {} bits but only have {} bits available",
            required_bits,
            available_bits
        );
    }

    let mut data_index = 0; // Current byte being embedded
    let mut bit_index = 0; // Current bit within the byte (0-7)

    'outer: for y in 0..height {
        for x in 0..width {
            if data_index >= data.len() {
                break 'outer;
            }

            let pixel = img.get_pixel_mut(x, y);

            for channel in 0..3 {
                if data_index >= data.len() {
                    break 'outer;
                }

                let bit = (data[data_index] >> (7 - bit_index)) & 1;
                pixel[channel] = (pixel[channel] & 0xFE) | bit;

                bit_index += 1;
                if bit_index == 8 {
                    bit_index = 0;
                    data_index += 1;
                }
            }
        }
    }

    Ok(())
}

/// LSBs of R, G, B for every pixel in row-major order.
fn lsb_stream(img: &RgbaImage) -> impl Iterator<Item = u8> + '_ {
    img.pixels().flat_map(|p| [p[0] & 1, p[1] & 1, p[2] & 1])
}

fn read_bytes<I: Iterator<Item = u8>>(bits: &mut I, count: usize) -> Option<Vec<u8>> {
    (0..count)
        .map(|_| {
            let mut byte = 0u8;
            for _ in 0..8 {
                byte = (byte << 1) | bits.next()?;
            }
            Some(byte)
        })
        .collect()
}
