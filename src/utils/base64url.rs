//! Base64URL encoding/decoding per RFC 4648
//!
//! This module provides a thin wrapper around the `base64` crate with
//! size limit validation. Callers map [`DecodeError`] into the domain error
//! of the segment or field being decoded.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use thiserror::Error;

/// Failure to decode a Base64URL value
#[derive(Error, Debug, Clone, PartialEq)]
pub(crate) enum DecodeError {
    #[error("Base64URL decode failed: {0}")]
    Base64(String),

    #[error("Decoded size exceeds limit: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid UTF-8: {0}")]
    Utf8(String),
}

/// Encode bytes as unpadded Base64URL
pub(crate) fn encode(input: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Decode Base64URL string to bytes with maximum size limit
pub(crate) fn decode_bytes(input: &str, max_size: usize) -> Result<Vec<u8>, DecodeError> {
    // Reject oversized input before allocating: 4 chars decode to at most 3 bytes
    if input.len() / 4 * 3 > max_size + 3 {
        return Err(DecodeError::TooLarge {
            size: input.len() / 4 * 3,
            max: max_size,
        });
    }

    let result = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    if result.len() > max_size {
        return Err(DecodeError::TooLarge {
            size: result.len(),
            max: max_size,
        });
    }

    Ok(result)
}

/// Decode Base64URL string to UTF-8 string with size limit
pub(crate) fn decode_string(input: &str, max_size: usize) -> Result<String, DecodeError> {
    decode_bytes(input, max_size).and_then(|bytes| {
        String::from_utf8(bytes).map_err(|e| DecodeError::Utf8(e.to_string()))
    })
}
