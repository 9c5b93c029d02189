//! Identity verification and session arbitration for gridgate.
//!
//! This crate decides the session fate of a login attempt:
//!
//! 1. **Authentication**: does the credential prove ownership of the
//!    identity? ([`Authenticator`], [`CredentialAuthenticator`])
//! 2. **Arbitration**: is the identity already online? If so the old
//!    session is forced offline and the attempt is refused; otherwise a new
//!    session is minted. ([`SessionArbiter`])
//! 3. **Serialization**: all of the above runs under the login lock so two
//!    concurrent logins can never both see "offline". ([`LoginGate`])
//!
//! Persistence is a collaborator behind [`IdentityStore`];
//! [`MemoryIdentityStore`] is the in-process implementation.
//!
//! # How it fits in the stack
//!
//! ```text
//! Grant layer (above)     ← builds the grant while the Admission holds the lock
//!     ↕
//! Session layer (this)    ← verifies, arbitrates, commits
//!     ↕
//! Protocol layer (below)  ← LoginRequest, NamePair, identifier newtypes
//! ```

mod arbiter;
pub mod auth;
mod error;
mod gate;
mod session;
mod store;

pub use arbiter::{Admission, SessionArbiter};
pub use auth::{Authenticator, CredentialAuthenticator};
pub use error::{SessionError, StoreError};
pub use gate::{LoginGate, LoginPermit, LoginSerialization};
pub use session::{Identity, Session};
pub use store::{IdentityStore, MemoryIdentityStore};
