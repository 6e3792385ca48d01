//! Codec trait and the JSON implementation used on the wire.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The room engine encodes each outbound event exactly once and hands the
//! same bytes to every connection in a fan-out, so encoding cost does not
//! grow with the number of players.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every connection handler and room actor in the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients parse every message with `JSON.parse`, so JSON is the
/// only format the quiz front-ends understand.
///
/// ## Example
///
/// ```rust
/// use quizforge_protocol::{Codec, Event, JsonCodec, ServerEvent, AllAnswered};
///
/// let codec = JsonCodec;
/// let bytes = codec
///     .encode(&ServerEvent::AllAnswered(AllAnswered { sleep: 3000 }))
///     .unwrap();
///
/// let event: Event = codec.decode(&bytes).unwrap();
/// assert_eq!(event.event, "event_all_answered");
/// assert_eq!(event.content["sleep"], 3000);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Event;

    #[test]
    fn test_decode_malformed_json_is_decode_error() {
        let err = JsonCodec.decode::<Event>(b"{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_missing_event_field_is_decode_error() {
        let err = JsonCodec.decode::<Event>(br#"{"content":"4"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }
}
