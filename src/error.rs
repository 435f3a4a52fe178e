//! Error types for replwire.

use thiserror::Error;

/// Main error type for all kernel protocol operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// I/O error during transport operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error (oversized frame, bad delimiter placement, etc.).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Frame sequence that cannot be decoded into a message.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// HMAC signature did not match the signed parts of the message.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Channel closed by the peer.
    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type alias using KernelError.
pub type Result<T> = std::result::Result<T, KernelError>;
