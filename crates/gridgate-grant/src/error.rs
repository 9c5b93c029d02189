//! Error types for grant assembly.

use gridgate_session::StoreError;

use crate::CustomizeError;

/// Why a grant could not be produced.
///
/// The two variants end differently for the client: a collaborator failure
/// is an internal failure, a customization failure means the destination is
/// unavailable while the session stays committed.
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    /// The inventory or friends collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The deployment's customizer refused or panicked.
    #[error("customization failed: {0}")]
    Customization(#[from] CustomizeError),
}
