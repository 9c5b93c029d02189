//! Protocol-agnostic request types and identifiers.
//!
//! Nothing in this module knows which wire encoding a request arrived in.
//! The adapters in [`crate::wire`] produce these types; everything above the
//! protocol layer (authentication, arbitration, grant building) consumes them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable 128-bit identifier of a registered identity (an avatar).
///
/// Serialized as a hyphenated lowercase UUID string, which keeps the
/// formatting identical in both wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for IdentityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of a live session. Used for both the session id and the
/// secure session id handed to the simulation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Identifier of an inventory folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub Uuid);

impl FolderId {
    /// The nil folder, used as the parent of root folders.
    pub const NIL: FolderId = FolderId(Uuid::nil());

    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for FolderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// NamePair
// ---------------------------------------------------------------------------

/// The identity selector: an avatar's first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePair {
    pub first: String,
    pub last: String,
}

impl NamePair {
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
        }
    }

    /// Case-folded `"first last"` key. Two selectors that differ only in
    /// letter case name the same identity.
    pub fn lookup_key(&self) -> String {
        format!("{} {}", self.first, self.last).to_lowercase()
    }
}

impl fmt::Display for NamePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.last)
    }
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// The secret a client presents. Exactly one mode per request.
///
/// `Debug` is implemented by hand so a request can be logged without
/// leaking the secret.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// A password, either in the clear or already in `$1$<md5>` form.
    Password(String),
    /// A web login key previously issued to the identity. Kept as the raw
    /// submitted string; it only authenticates if it parses as a UUID.
    Token(String),
}

impl Credential {
    /// Short name of the mode, for logs.
    pub fn mode(&self) -> &'static str {
        match self {
            Credential::Password(_) => "password",
            Credential::Token(_) => "token",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential::{}(<redacted>)", self.mode())
    }
}

// ---------------------------------------------------------------------------
// StartLocation
// ---------------------------------------------------------------------------

/// Where the client asked to enter the world.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StartLocation {
    /// The location the identity last logged out from.
    #[default]
    Last,
    /// The identity's home location.
    Home,
    /// A named region and position, from a `uri:Region&x&y&z` request.
    Region { name: String, x: f32, y: f32, z: f32 },
}

impl StartLocation {
    /// Parses the `start` request field.
    ///
    /// Accepts `last`, `home` (any case) and `uri:<Region>&<x>&<y>&<z>`.
    /// Coordinates that are missing, not numbers, or not finite fall back to
    /// the region center (128, 128, 0). Anything unrecognised means `Last`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("last") {
            return StartLocation::Last;
        }
        if trimmed.eq_ignore_ascii_case("home") {
            return StartLocation::Home;
        }

        let Some(rest) = trimmed.strip_prefix("uri:") else {
            return StartLocation::Last;
        };

        let mut parts = rest.split('&');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return StartLocation::Last;
        }

        let mut coord = |default: f32| {
            parts
                .next()
                .and_then(|p| p.trim().parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(default)
        };
        let x = coord(128.0);
        let y = coord(128.0);
        let z = coord(0.0);

        StartLocation::Region {
            name: name.to_string(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for StartLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartLocation::Last => f.write_str("last"),
            StartLocation::Home => f.write_str("home"),
            StartLocation::Region { name, x, y, z } => {
                write!(f, "uri:{name}&{x}&{y}&{z}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// LoginRequest
// ---------------------------------------------------------------------------

/// A validated login attempt, independent of the encoding it arrived in.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Which identity is logging in.
    pub name: NamePair,
    /// Password or token. The type makes "exactly one" unrepresentable
    /// any other way.
    pub credential: Credential,
    /// Requested start location, `Last` when not given.
    pub start: StartLocation,
    /// Free-form viewer version string, only ever logged.
    pub client_version: Option<String>,
}
