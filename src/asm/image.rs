//! UM program images (`.um` files).
//!
//! An image is a flat sequence of 32-bit instruction words, each stored
//! big-endian (most significant byte first). There is no header.

use crate::bitpack;
use log::{debug, warn};
use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Bytes per instruction word.
pub const WORD_BYTES: usize = 4;

/// What to do with an image whose length is not a multiple of four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrailingBytes {
    /// Refuse to load the image.
    #[default]
    Reject,
    /// Zero-fill the missing low-order bytes of the last word.
    Pad,
}

/// Pack raw image bytes into instruction words.
pub fn parse_image(bytes: &[u8], trailing: TrailingBytes) -> Result<Vec<u32>, ImageError> {
    let remainder = bytes.len() % WORD_BYTES;
    if remainder != 0 {
        match trailing {
            TrailingBytes::Reject => {
                return Err(ImageError::TrailingBytes { len: bytes.len() });
            }
            TrailingBytes::Pad => {
                warn!(
                    "image length {} is not a multiple of {}; padding last word",
                    bytes.len(),
                    WORD_BYTES
                );
            }
        }
    }

    let words = bytes
        .chunks(WORD_BYTES)
        .map(pack_word)
        .collect::<Vec<_>>();
    debug!("parsed {} bytes into {} words", bytes.len(), words.len());
    Ok(words)
}

/// Pack up to four bytes into one word, first byte in bits 31-24.
fn pack_word(chunk: &[u8]) -> u32 {
    chunk.iter().enumerate().fold(0u32, |word, (i, &byte)| {
        let lsb = 32 - 8 * (i as u32 + 1);
        // A byte always fits in an 8-bit field.
        bitpack::new_u32(word, 8, lsb, byte as u32).unwrap_or(word)
    })
}

/// Serialize instruction words to image bytes.
pub fn encode_image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Load an image from disk.
pub fn load_image<P: AsRef<Path>>(path: P, trailing: TrailingBytes) -> Result<Vec<u32>, ImageError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_image(&bytes, trailing)
}

/// Write an image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, words: &[u32]) -> Result<(), ImageError> {
    let path = path.as_ref();
    std::fs::write(path, encode_image(words)).map_err(|e| ImageError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("cannot access {path}: {message}")]
    Io { path: String, message: String },

    #[error("image length {len} is not a multiple of 4 bytes")]
    TrailingBytes { len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_packing() {
        let words = parse_image(&[0xD2, 0x00, 0x00, 0x48, 0x70, 0, 0, 0], TrailingBytes::Reject).unwrap();
        assert_eq!(words, vec![0xD200_0048, 0x7000_0000]);
    }

    #[test]
    fn test_empty_image() {
        assert_eq!(parse_image(&[], TrailingBytes::Reject).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(
            parse_image(&[1, 2, 3, 4, 5], TrailingBytes::Reject),
            Err(ImageError::TrailingBytes { len: 5 })
        );
    }

    #[test]
    fn test_trailing_bytes_padded() {
        let words = parse_image(&[1, 2, 3, 4, 0xAB, 0xCD], TrailingBytes::Pad).unwrap();
        assert_eq!(words, vec![0x0102_0304, 0xABCD_0000]);
    }

    #[test]
    fn test_encode_image() {
        assert_eq!(encode_image(&[0x0102_0304, 0xFF00_00FE]), vec![1, 2, 3, 4, 0xFF, 0, 0, 0xFE]);
    }

    #[test]
    fn test_missing_file() {
        let err = load_image("/nonexistent/prog.um", TrailingBytes::Reject).unwrap_err();
        assert!(matches!(err, ImageError::Io { .. }));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("um-image-test-{}.um", std::process::id()));
        save_image(&path, &[0xD200_0048, 0x7000_0000]).unwrap();
        let words = load_image(&path, TrailingBytes::Reject).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(words, vec![0xD200_0048, 0x7000_0000]);
    }
}
