//! Credential verification.
//!
//! Two modes, picked by which [`Credential`] the client sent:
//!
//! - **Password.** Stored credentials are `md5(md5(password) + ":" + salt)`.
//!   Clients may send the password in the clear or pre-hashed as
//!   `$1$<md5(password)>`. Both are brought to the pre-hashed form, the
//!   `$1$` prefix is stripped, and the result is salted and hashed again.
//!   For backward compatibility a login is also accepted when the stripped
//!   value already equals the stored hash verbatim.
//! - **Token.** The submitted web login key must equal the stored one, and
//!   the stored one must not be nil. An unset (nil) key never authenticates,
//!   not even against a nil submission.
//!
//! Verification is a plain yes/no. Turning "no" into a rejection is the
//! arbiter's job.

use gridgate_protocol::Credential;
use md5::{Digest, Md5};
use rand::Rng;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::Identity;

/// Marks a password that the client has already hashed once.
pub const HASHED_PASSWORD_PREFIX: &str = "$1$";

/// Lowercase hex MD5 of a string.
pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Brings a submitted password to the `$1$<md5>` form. Values that already
/// carry the prefix are returned unchanged.
pub fn canonical_password(password: &str) -> String {
    if password.starts_with(HASHED_PASSWORD_PREFIX) {
        password.to_string()
    } else {
        format!("{HASHED_PASSWORD_PREFIX}{}", md5_hex(password))
    }
}

/// The stored form of a password: `md5(md5(password) + ":" + salt)`.
///
/// Use this when provisioning identities.
pub fn salted_password_hash(password: &str, salt: &str) -> String {
    md5_hex(&format!("{}:{salt}", md5_hex(password)))
}

/// 128 random bits as 32 hex characters.
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

/// Decides whether a credential proves ownership of an identity.
///
/// The arbiter is generic over this trait so a deployment can swap the
/// scheme (or a test can stub it) without touching arbitration.
pub trait Authenticator: Send + Sync + 'static {
    /// Returns `true` if `credential` authenticates `identity`.
    fn verify(&self, identity: &Identity, credential: &Credential) -> bool;
}

/// The standard password-or-token scheme described in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialAuthenticator;

impl CredentialAuthenticator {
    /// Password mode.
    pub fn verify_password(identity: &Identity, password: &str) -> bool {
        let canonical = canonical_password(password);
        let stripped = &canonical[HASHED_PASSWORD_PREFIX.len()..];

        let salted = md5_hex(&format!("{stripped}:{}", identity.password_salt));

        identity.password_hash.eq_ignore_ascii_case(&salted)
            || identity.password_hash.eq_ignore_ascii_case(stripped)
    }

    /// Token mode. A submission that is not a UUID never matches.
    pub fn verify_token(identity: &Identity, token: &str) -> bool {
        let Ok(submitted) = Uuid::parse_str(token.trim()) else {
            return false;
        };
        if identity.web_login_key.is_nil() {
            return false;
        }
        identity
            .web_login_key
            .as_bytes()
            .ct_eq(submitted.as_bytes())
            .into()
    }
}

impl Authenticator for CredentialAuthenticator {
    fn verify(&self, identity: &Identity, credential: &Credential) -> bool {
        tracing::debug!(
            first = %identity.first_name,
            last = %identity.last_name,
            agent_id = %identity.id,
            mode = credential.mode(),
            "verifying credential"
        );
        match credential {
            Credential::Password(password) => Self::verify_password(identity, password),
            Credential::Token(token) => Self::verify_token(identity, token),
        }
    }
}
