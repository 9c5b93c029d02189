//! The friends collaborator and the buddy-list snippet built from it.

use std::collections::HashMap;

use gridgate_protocol::{BuddyEntry, IdentityId};
use gridgate_session::StoreError;
use parking_lot::RwLock;

/// One friendship as seen from its owner's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendEntry {
    pub friend: IdentityId,
    /// Rights the owner grants to the friend.
    pub friend_rights: u32,
    /// Rights the friend grants to the owner.
    pub owner_rights: u32,
}

impl From<FriendEntry> for BuddyEntry {
    fn from(entry: FriendEntry) -> Self {
        BuddyEntry {
            buddy_id: entry.friend,
            buddy_rights_given: entry.friend_rights,
            buddy_rights_has: entry.owner_rights,
        }
    }
}

/// Where friend lists come from.
pub trait FriendsStore: Send + Sync + 'static {
    fn fetch_friends(&self, owner: IdentityId) -> Result<Vec<FriendEntry>, StoreError>;
}

/// A [`FriendsStore`] kept in process memory. Entries keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryFriends {
    lists: RwLock<HashMap<IdentityId, Vec<FriendEntry>>>,
}

impl MemoryFriends {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a friendship in both directions. `a_grants` are the rights
    /// `a` gives `b`, `b_grants` the rights `b` gives `a`.
    pub fn befriend(&self, a: IdentityId, b: IdentityId, a_grants: u32, b_grants: u32) {
        let mut lists = self.lists.write();
        lists.entry(a).or_default().push(FriendEntry {
            friend: b,
            friend_rights: a_grants,
            owner_rights: b_grants,
        });
        lists.entry(b).or_default().push(FriendEntry {
            friend: a,
            friend_rights: b_grants,
            owner_rights: a_grants,
        });
    }
}

impl FriendsStore for MemoryFriends {
    fn fetch_friends(&self, owner: IdentityId) -> Result<Vec<FriendEntry>, StoreError> {
        Ok(self.lists.read().get(&owner).cloned().unwrap_or_default())
    }
}
