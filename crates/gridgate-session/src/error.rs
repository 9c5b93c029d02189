//! Error types for the session layer.

use gridgate_protocol::NamePair;

/// Why a login attempt was refused by the arbiter.
///
/// Every variant except [`SessionError::Store`] is a normal outcome that
/// ends up in the reply to the client, not a fault.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No identity is registered under this name pair.
    #[error("no identity named {0}")]
    IdentityNotFound(NamePair),

    /// The identity exists but the password or token did not verify.
    #[error("authentication failed for {0}")]
    AuthenticationFailed(NamePair),

    /// The identity already had an online session. That session has been
    /// forced offline; the client has to retry.
    #[error("{0} already has an online session")]
    AlreadyLoggedIn(NamePair),

    /// The identity store failed underneath us.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A collaborator (identity store, inventory, friends) could not serve a
/// request. Carries the collaborator's own description of what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store failure: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
