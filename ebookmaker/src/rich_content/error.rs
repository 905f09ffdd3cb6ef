//! Error types for rich content parsing and embedded image data

use thiserror::Error;

/// Errors that can occur while parsing an HTML fragment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The tokenizer rejected the fragment
    #[error("Malformed markup at byte {position}: {message}")]
    Malformed {
        /// Byte offset where the tokenizer stopped
        position: u64,
        /// Tokenizer message
        message: String,
    },
}

/// Errors that can occur while decoding an inline image source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageDataError {
    /// The source is not a `data:` URL (remote images are not fetched)
    #[error("Image source is not a data URL")]
    NotDataUrl,

    /// The data URL is not base64 encoded
    #[error("Unsupported data URL encoding: {0}")]
    UnsupportedEncoding(String),

    /// The base64 payload failed to decode
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),
}
