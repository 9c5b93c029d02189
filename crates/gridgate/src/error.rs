//! Error types for the gridgate meta-crate.
//!
//! [`LoginError`] is the outcome of one login attempt that did not end in a
//! grant. Every variant is a normal result rendered into the reply; none of
//! them crash a connection. [`GridgateError`] is for the server surface
//! around it: sockets and reply encoding.

use gridgate_grant::{CustomizeError, GrantError};
use gridgate_protocol::{NamePair, ProtocolError, Rejection};
use gridgate_session::SessionError;
use gridgate_transport::TransportError;

/// Why a login attempt was refused.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The frame was unreadable or lacked a required field. Nothing was
    /// locked and no collaborator was called.
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] ProtocolError),

    #[error("no identity named {0}")]
    IdentityNotFound(NamePair),

    #[error("authentication failed for {0}")]
    AuthenticationFailed(NamePair),

    /// A previous session was online and has been forced offline. A retry
    /// will succeed.
    #[error("{0} was already logged in")]
    AlreadyLoggedIn(NamePair),

    /// The session is committed and the identity is online, but the
    /// deployment could not place it anywhere.
    #[error("destination unavailable: {0}")]
    DestinationUnavailable(#[source] CustomizeError),

    /// A collaborator failed or something panicked. Details are logged,
    /// never sent to the client.
    #[error("internal failure: {0}")]
    InternalFailure(String),
}

impl LoginError {
    /// The wire rejection for this outcome.
    pub fn rejection(&self) -> Rejection {
        match self {
            LoginError::MalformedRequest(_) => Rejection::MalformedRequest,
            LoginError::IdentityNotFound(_) | LoginError::AuthenticationFailed(_) => {
                Rejection::LoginFailed
            }
            LoginError::AlreadyLoggedIn(_) => Rejection::AlreadyLoggedIn,
            LoginError::DestinationUnavailable(_) => Rejection::DestinationUnavailable,
            LoginError::InternalFailure(_) => Rejection::InternalFailure,
        }
    }
}

impl From<ProtocolError> for LoginError {
    fn from(e: ProtocolError) -> Self {
        LoginError::MalformedRequest(e)
    }
}

impl From<SessionError> for LoginError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::IdentityNotFound(name) => LoginError::IdentityNotFound(name),
            SessionError::AuthenticationFailed(name) => LoginError::AuthenticationFailed(name),
            SessionError::AlreadyLoggedIn(name) => LoginError::AlreadyLoggedIn(name),
            SessionError::Store(store) => LoginError::InternalFailure(store.to_string()),
        }
    }
}

impl From<GrantError> for LoginError {
    fn from(e: GrantError) -> Self {
        match e {
            GrantError::Store(store) => LoginError::InternalFailure(store.to_string()),
            GrantError::Customization(c) => LoginError::DestinationUnavailable(c),
        }
    }
}

/// Top-level error for running a gridgate server.
#[derive(Debug, thiserror::Error)]
pub enum GridgateError {
    /// Binding, accepting, sending, or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A reply could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
