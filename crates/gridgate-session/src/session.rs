//! Identity and session records.
//!
//! An [`Identity`] is a registered avatar with its credentials. It owns at
//! most one [`Session`]: the live state handed to the simulation layer.
//! A session has no life of its own; it is stored inside the identity and
//! persisted together with it.

use std::time::{SystemTime, UNIX_EPOCH};

use gridgate_protocol::{FolderId, IdentityId, NamePair, SessionId, StartLocation};
use rand::Rng;
use uuid::Uuid;

use crate::auth;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The online state of one identity.
///
/// ```text
///   mint() ──→ online ──(forced offline by a conflicting login)──→ offline
///                 │
///                 └──(logout, handled outside the broker)──→ offline
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: SessionId,
    /// Second secret id; only the owning client and the simulator know it.
    pub secure_session_id: SessionId,
    pub online: bool,
    /// Random 32-bit handle the simulator uses to key the client's circuit.
    pub circuit_code: u32,
    /// Unix seconds at mint time.
    pub logged_in_at: u64,
    /// Where the client asked to start when this session was minted.
    pub start_location: StartLocation,
}

impl Session {
    /// Creates a fresh online session with new random identifiers.
    pub fn mint(start_location: StartLocation) -> Self {
        let mut rng = rand::rng();
        Self {
            session_id: SessionId::random(),
            secure_session_id: SessionId::random(),
            online: true,
            circuit_code: rng.random(),
            logged_in_at: unix_now(),
            start_location,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A registered identity as the identity store hands it to the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: IdentityId,
    pub first_name: String,
    pub last_name: String,

    /// `md5(md5(password) + ":" + salt)` as lowercase hex. See
    /// [`auth::salted_password_hash`].
    pub password_hash: String,
    pub password_salt: String,

    /// Token for web-form logins. The nil UUID means "never issued" and
    /// can never authenticate.
    pub web_login_key: Uuid,

    /// Root of the identity's inventory, recorded after the first grant.
    pub inventory_root: Option<FolderId>,

    pub current_session: Option<Session>,
}

impl Identity {
    /// Provisions a new identity with a random id and a fresh salt.
    pub fn new(first: impl Into<String>, last: impl Into<String>, password: &str) -> Self {
        Self::with_id(IdentityId::random(), first, last, password)
    }

    /// Provisions an identity under a known id.
    pub fn with_id(
        id: IdentityId,
        first: impl Into<String>,
        last: impl Into<String>,
        password: &str,
    ) -> Self {
        let salt = auth::generate_salt();
        Self {
            id,
            first_name: first.into(),
            last_name: last.into(),
            password_hash: auth::salted_password_hash(password, &salt),
            password_salt: salt,
            web_login_key: Uuid::nil(),
            inventory_root: None,
            current_session: None,
        }
    }

    pub fn name(&self) -> NamePair {
        NamePair::new(self.first_name.clone(), self.last_name.clone())
    }

    /// `true` if the identity currently holds an online session.
    pub fn is_online(&self) -> bool {
        self.current_session.as_ref().is_some_and(|s| s.online)
    }
}
