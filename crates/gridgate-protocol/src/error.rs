//! Error types for the protocol layer.
//!
//! Each gridgate crate owns its error enum. A `ProtocolError` always means
//! the problem is in turning frames into requests (or replies into frames),
//! never in authentication or session state.

/// Errors that can occur while decoding login frames or encoding replies.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a reply failed.
    ///
    /// With JSON this only happens for values serde cannot represent,
    /// such as maps keyed by non-strings.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame could not be parsed at all (not JSON, not an object,
    /// or a field carried the wrong type).
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed, but a required login field is absent.
    ///
    /// The string names what was missing, e.g. `"last"` or
    /// `"passwd or web_login_key"`.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}
