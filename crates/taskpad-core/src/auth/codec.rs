//! Reversible encoding for the persisted bearer token.
//!
//! The stored form is standard padded base64 of the token's UTF-8 bytes.
//! This only keeps the token from sitting in storage as plain text; it is
//! not encryption.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("stored credential is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("stored credential is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Encode a token for storage
pub fn encode(token: &str) -> String {
    STANDARD.encode(token.as_bytes())
}

/// Decode a stored value back into the token
pub fn decode(stored: &str) -> Result<String, DecodeError> {
    let bytes = STANDARD.decode(stored.trim())?;
    Ok(String::from_utf8(bytes)?)
}
