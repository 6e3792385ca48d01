//! Error types for the protocol layer.
//!
//! Each crate in Quizforge defines its own error enum. When you see a
//! `ProtocolError`, the problem is in (de)serialization or in the shape of
//! an inbound event, not in networking or room logic.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope parsed, but names an event this endpoint doesn't accept.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The event is known but its `content` has the wrong shape.
    #[error("invalid content for {event}: {reason}")]
    InvalidContent { event: String, reason: String },
}
