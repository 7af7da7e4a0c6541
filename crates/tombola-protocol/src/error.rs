//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means "serialization went wrong" — not
//! networking, not game rules. Peers treat decode failures as noise on the
//! channel: logged and dropped, never fatal.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a command into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a command).
    ///
    /// Common causes: malformed JSON, an unknown `command` tag, missing
    /// fields, or a truncated frame. The dispatcher contract is to ignore
    /// such frames silently, so this error never propagates past the
    /// decode call site.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
