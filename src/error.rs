//! Error types for SenML operations

use thiserror::Error;

/// Result type alias for SenML operations
pub type Result<T> = std::result::Result<T, SenMLError>;

/// Errors that can occur while building, rendering, or parsing SenML packs
#[derive(Error, Debug)]
pub enum SenMLError {
    /// Underlying byte sink or source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally malformed JSON input
    #[error("invalid JSON at byte {position}: {message}")]
    InvalidJson { position: usize, message: String },

    /// Structurally malformed CBOR input
    #[error("invalid CBOR: {message}")]
    InvalidCbor { message: String },

    /// Text that should be UTF-8 was not
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// Base64-framed binary value could not be decoded
    #[error("invalid base64 data: {message}")]
    InvalidBase64 { message: String },

    /// Input ended before the document was complete
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Rendering failed for a reason other than sink I/O
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl SenMLError {
    /// Create an invalid JSON error at a byte offset
    pub fn invalid_json<S: Into<String>>(position: usize, message: S) -> Self {
        Self::InvalidJson {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid CBOR error
    pub fn invalid_cbor<S: Into<String>>(message: S) -> Self {
        Self::InvalidCbor {
            message: message.into(),
        }
    }

    /// Create an invalid base64 error
    pub fn invalid_base64<S: Into<String>>(message: S) -> Self {
        Self::InvalidBase64 {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}
