//! Wire protocol for gridgate.
//!
//! This crate defines what a login looks like before and after the core
//! handles it:
//!
//! - **Types** ([`LoginRequest`], [`Credential`], [`StartLocation`], the
//!   identifier newtypes): the protocol-agnostic request.
//! - **Grant** ([`LoginGrant`] and its parts): the successful response.
//! - **Wire** ([`decode_request`], [`encode_reply`], [`Encoding`],
//!   [`Rejection`]): the flat and structured encodings and the request
//!   normalizer shared by both.
//! - **Codec** ([`Codec`], [`JsonCodec`]): frames to bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (LoginRequest) → Session (Identity, Session)
//!                   ← Protocol (LoginGrant)   ← Grant builder
//! ```

mod codec;
mod error;
mod grant;
mod types;
pub mod wire;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use grant::{BuddyEntry, Destination, FolderDescriptor, LoginGrant};
pub use types::{
    Credential, FolderId, IdentityId, LoginRequest, NamePair, SessionId, StartLocation,
};
pub use wire::{Decoded, Encoding, RawLogin, Rejection, Reply, decode_request, encode_reply};
