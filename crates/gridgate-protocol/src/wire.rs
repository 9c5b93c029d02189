//! The two wire encodings of a login exchange.
//!
//! Clients speak one of two shapes:
//!
//! ```text
//! Flat:        { "first": "Jane", "last": "Doe", "passwd": "...", "start": "last" }
//! Structured:  { "map": { "first": "Jane", "last": "Doe", "passwd": "..." } }
//! ```
//!
//! Both decode into the same [`RawLogin`] field set, pass through one
//! [`normalize`] function, and come back out through one reply renderer.
//! The only thing an encoding decides is the container. Authentication and
//! arbitration never see which one was used.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Codec, Credential, LoginGrant, LoginRequest, NamePair, ProtocolError, StartLocation};

/// Top-level key that marks the structured encoding.
pub const STRUCTURED_TAG: &str = "map";

/// Which container shape a frame used. Replies go back in the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Keys at the top level of the document.
    #[default]
    Flat,
    /// Keys nested one level under [`STRUCTURED_TAG`].
    Structured,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Login fields exactly as a client sent them, before validation.
///
/// Every field is optional here; [`normalize`] decides what is required.
/// Unknown keys are ignored so newer viewers can send extra data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLogin {
    pub first: Option<String>,
    pub last: Option<String>,
    pub passwd: Option<String>,
    pub web_login_key: Option<String>,
    pub start: Option<String>,
    pub version: Option<String>,
}

/// Result of reading one inbound frame.
///
/// The encoding is reported even when the request is invalid, so the
/// rejection can be rendered in the shape the client understands.
#[derive(Debug)]
pub struct Decoded {
    pub encoding: Encoding,
    pub request: Result<LoginRequest, ProtocolError>,
}

/// Reads one frame and validates it into a [`LoginRequest`].
///
/// Pure: no I/O, no locks, no collaborator calls. A frame that cannot be
/// parsed at all is reported as [`Encoding::Flat`].
pub fn decode_request<C: Codec>(codec: &C, frame: &[u8]) -> Decoded {
    let document: Value = match codec.decode(frame) {
        Ok(document) => document,
        Err(e) => {
            return Decoded {
                encoding: Encoding::Flat,
                request: Err(e),
            };
        }
    };

    let (encoding, fields) = split_container(document);
    Decoded {
        encoding,
        request: serde_json::from_value::<RawLogin>(fields)
            .map_err(ProtocolError::Decode)
            .and_then(normalize),
    }
}

/// Picks the encoding from the container alone, before any field is read,
/// so a bad field inside `map` is still answered in the structured shape.
fn split_container(document: Value) -> (Encoding, Value) {
    match document {
        Value::Object(mut top) if matches!(top.get(STRUCTURED_TAG), Some(Value::Object(_))) => {
            let fields = top.remove(STRUCTURED_TAG).unwrap_or_default();
            (Encoding::Structured, fields)
        }
        other => (Encoding::Flat, other),
    }
}

/// Validates raw fields into a protocol-agnostic request.
///
/// Required: `first`, `last`, and at least one of `passwd` /
/// `web_login_key`. Presence is key presence, so an empty string counts.
/// When both credentials are supplied the password is used.
///
/// # Errors
/// [`ProtocolError::MissingField`] naming the first absent requirement.
pub fn normalize(raw: RawLogin) -> Result<LoginRequest, ProtocolError> {
    let first = raw.first.ok_or(ProtocolError::MissingField("first"))?;
    let last = raw.last.ok_or(ProtocolError::MissingField("last"))?;

    let credential = match (raw.passwd, raw.web_login_key) {
        (Some(passwd), _) => Credential::Password(passwd),
        (None, Some(key)) => Credential::Token(key),
        (None, None) => {
            return Err(ProtocolError::MissingField("passwd or web_login_key"));
        }
    };

    Ok(LoginRequest {
        name: NamePair { first, last },
        credential,
        start: raw
            .start
            .as_deref()
            .map(StartLocation::parse)
            .unwrap_or_default(),
        client_version: raw.version,
    })
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// The distinct ways a login can be refused on the wire.
///
/// An unknown identity and a bad credential share [`Rejection::LoginFailed`]
/// so a client cannot probe which names exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MalformedRequest,
    LoginFailed,
    AlreadyLoggedIn,
    DestinationUnavailable,
    InternalFailure,
}

impl Rejection {
    /// Machine-readable discriminator, the `kind` field.
    pub fn kind(self) -> &'static str {
        match self {
            Rejection::MalformedRequest => "malformed_request",
            Rejection::LoginFailed => "login_failed",
            Rejection::AlreadyLoggedIn => "already_logged_in",
            Rejection::DestinationUnavailable => "destination_unavailable",
            Rejection::InternalFailure => "internal_failure",
        }
    }

    /// The `reason` field viewers switch on.
    pub fn reason(self) -> &'static str {
        match self {
            Rejection::AlreadyLoggedIn => "presence",
            _ => "key",
        }
    }

    /// Human-readable text shown by the viewer.
    pub fn message(self) -> &'static str {
        match self {
            Rejection::MalformedRequest => {
                "Error connecting to grid. Could not perceive credentials from login request."
            }
            Rejection::LoginFailed => {
                "Could not authenticate your avatar. Please check your username and password, and check the grid if problems persist."
            }
            Rejection::AlreadyLoggedIn => {
                "You appear to be already logged in. If this is not the case please wait for your session to timeout. If this takes longer than a few minutes please contact the grid owner. Please wait 5 minutes if you are going to connect to a region nearby to the region you were at previously."
            }
            Rejection::DestinationUnavailable => {
                "The region you are attempting to log into is not responding. Please select another region and try again."
            }
            Rejection::InternalFailure => {
                "Error connecting to grid. Login could not be completed, please try again."
            }
        }
    }
}

/// What to send back for one login frame.
#[derive(Debug, Clone, Copy)]
pub enum Reply<'a> {
    Granted(&'a LoginGrant),
    Rejected(Rejection),
}

#[derive(Serialize)]
struct GrantBody<'a> {
    login: &'static str,
    #[serde(flatten)]
    grant: &'a LoginGrant,
}

#[derive(Serialize)]
struct RejectionBody {
    login: &'static str,
    reason: &'static str,
    message: &'static str,
    kind: &'static str,
}

/// Builds the reply object independent of container shape.
///
/// Goes through `serde_json::Value` so that a flattened `extra` key that
/// repeats a fixed key replaces it instead of being emitted twice.
pub fn reply_body(reply: Reply<'_>) -> Result<serde_json::Value, ProtocolError> {
    match reply {
        Reply::Granted(grant) => serde_json::to_value(GrantBody {
            login: "true",
            grant,
        }),
        Reply::Rejected(rejection) => serde_json::to_value(RejectionBody {
            login: "false",
            reason: rejection.reason(),
            message: rejection.message(),
            kind: rejection.kind(),
        }),
    }
    .map_err(ProtocolError::Encode)
}

/// Renders a reply in the given encoding and encodes it with the codec.
pub fn encode_reply<C: Codec>(
    codec: &C,
    encoding: Encoding,
    reply: Reply<'_>,
) -> Result<Vec<u8>, ProtocolError> {
    let body = reply_body(reply)?;
    match encoding {
        Encoding::Flat => codec.encode(&body),
        Encoding::Structured => {
            let mut wrapper = serde_json::Map::with_capacity(1);
            wrapper.insert(STRUCTURED_TAG.to_string(), body);
            codec.encode(&wrapper)
        }
    }
}
