//! # gridgate
//!
//! Login and session broker for virtual-world grids.
//!
//! gridgate authenticates a returning identity, guarantees that it has at
//! most one online session, and hands the client a grant (session ids,
//! circuit code, inventory skeleton, buddy list, destination) that the
//! simulation nodes use to admit it.
//!
//! ## Layers
//!
//! | Crate                | Role                                          |
//! |----------------------|-----------------------------------------------|
//! | `gridgate-protocol`  | request/grant types, flat and structured wire |
//! | `gridgate-session`   | credential checks, login lock, arbitration    |
//! | `gridgate-grant`     | grant assembly and deployment customization   |
//! | `gridgate-transport` | WebSocket frames                              |
//! | `gridgate` (this)    | [`LoginService`], [`GridgateServer`]          |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gridgate::prelude::*;
//!
//! # async fn run() -> Result<(), GridgateError> {
//! let store = Arc::new(MemoryIdentityStore::new());
//! store.insert(Identity::new("Jane", "Doe", "secret"));
//!
//! let grants = GrantBuilder::new(
//!     Arc::new(MemoryInventory::new()),
//!     Arc::new(MemoryFriends::new()),
//! );
//!
//! let server = GridgateServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(store, CredentialAuthenticator, grants)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod service;

pub use config::{DEFAULT_REQUEST_TIMEOUT, LoginConfig};
pub use error::{GridgateError, LoginError};
pub use gridgate_session::LoginSerialization;
pub use server::{GridgateServer, GridgateServerBuilder};
pub use service::LoginService;

/// Everything needed to stand up a login server.
pub mod prelude {
    pub use crate::{
        GridgateError, GridgateServer, GridgateServerBuilder, LoginConfig, LoginError,
        LoginSerialization, LoginService,
    };
    pub use gridgate_grant::{
        CustomizeError, FriendEntry, FriendsStore, GrantBuilder, GrantCustomizer,
        InventoryService, InventorySkeleton, LibrarySource, MemoryFriends, MemoryInventory,
        NoCustomization, RegionDirectory, RegionInfo, StaticLibrary,
    };
    pub use gridgate_protocol::{
        Credential, Destination, Encoding, FolderId, IdentityId, LoginGrant, LoginRequest,
        NamePair, Rejection, SessionId, StartLocation,
    };
    pub use gridgate_session::{
        Authenticator, CredentialAuthenticator, Identity, IdentityStore, MemoryIdentityStore,
        Session, StoreError,
    };
}
