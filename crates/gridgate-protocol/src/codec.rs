//! Byte-level codec for login frames.
//!
//! The wire encodings in [`crate::wire`] decide the *shape* of a request or
//! reply (flat map vs. `{"map": {...}}`). The codec decides how that shape
//! becomes bytes. Keeping the two apart means a deployment can swap the
//! byte format without touching normalization or rendering.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts typed frames to bytes and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task the server spawns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses a frame into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that reads and writes JSON documents.
///
/// ```rust
/// use gridgate_protocol::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&serde_json::json!({ "first": "Jane" })).unwrap();
/// let back: serde_json::Value = codec.decode(&bytes).unwrap();
/// assert_eq!(back["first"], "Jane");
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
