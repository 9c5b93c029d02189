//! The session grant: everything a client needs to enter the world.
//!
//! A [`LoginGrant`] is built by the response builder and rendered by the
//! wire adapters. Its `Serialize` impl *is* the wire field set, so both
//! encodings carry exactly the same keys with the same formatting.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::{FolderId, IdentityId, SessionId};

/// One inventory folder in a skeleton listing (no items).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderDescriptor {
    pub folder_id: FolderId,
    pub parent_id: FolderId,
    pub name: String,
    /// Asset type the folder holds by default; `-1` for plain folders.
    pub type_default: i32,
    pub version: i32,
}

/// One entry of the social-graph snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuddyEntry {
    pub buddy_id: IdentityId,
    /// Permission bits this identity granted to the friend.
    pub buddy_rights_given: u32,
    /// Permission bits the friend granted to this identity.
    pub buddy_rights_has: u32,
}

/// Where the client should connect after login. Filled in by the
/// deployment's customization step; defaults are empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Destination {
    pub sim_ip: String,
    pub sim_port: u16,
    pub region_x: u32,
    pub region_y: u32,
    pub look_at: String,
    pub home: String,
    pub seed_capability: String,
}

/// The full successful login payload.
///
/// Keys in `extra` are flattened into the top level after every fixed
/// field, so when a deployment reuses a fixed key name the `extra` value
/// is the one rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginGrant {
    pub first_name: String,
    pub last_name: String,
    pub agent_id: IdentityId,
    pub session_id: SessionId,
    pub secure_session_id: SessionId,
    pub circuit_code: u32,

    #[serde(rename = "inventory-root", serialize_with = "folder_ref")]
    pub inventory_root: FolderId,
    #[serde(rename = "inventory-skeleton")]
    pub inventory_skeleton: Vec<FolderDescriptor>,

    #[serde(rename = "inventory-lib-root", serialize_with = "folder_ref")]
    pub library_root: FolderId,
    #[serde(rename = "inventory-lib-owner", serialize_with = "owner_ref")]
    pub library_owner: IdentityId,
    #[serde(rename = "inventory-skel-lib")]
    pub library_skeleton: Vec<FolderDescriptor>,

    #[serde(rename = "buddy-list")]
    pub buddy_list: Vec<BuddyEntry>,

    pub message: String,

    #[serde(flatten)]
    pub destination: Destination,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// Viewers expect single references wrapped in a one-element list of maps,
// e.g. `"inventory-root": [{"folder_id": "..."}]`.

fn folder_ref<S: Serializer>(id: &FolderId, s: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct FolderRef<'a> {
        folder_id: &'a FolderId,
    }
    [FolderRef { folder_id: id }].serialize(s)
}

fn owner_ref<S: Serializer>(id: &IdentityId, s: S) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct OwnerRef<'a> {
        agent_id: &'a IdentityId,
    }
    [OwnerRef { agent_id: id }].serialize(s)
}
