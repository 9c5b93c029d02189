//! The inventory collaborator.
//!
//! At login the client only receives the folder *skeleton*: every folder
//! with its parent, name, and default type, but no items. The folder engine
//! itself lives outside the broker behind [`InventoryService`].

use std::collections::HashMap;

use gridgate_protocol::{FolderDescriptor, FolderId, IdentityId};
use gridgate_session::StoreError;
use parking_lot::RwLock;

/// Asset type of an identity's root folder.
pub const ROOT_FOLDER_TYPE: i32 = 8;

/// The typed folders every new inventory starts with, as `(name, type)`.
pub const STANDARD_FOLDERS: &[(&str, i32)] = &[
    ("Textures", 0),
    ("Sounds", 1),
    ("Calling Cards", 2),
    ("Landmarks", 3),
    ("Clothing", 5),
    ("Objects", 6),
    ("Notecards", 7),
    ("Scripts", 10),
    ("Body Parts", 13),
    ("Trash", 14),
    ("Photo Album", 15),
    ("Lost And Found", 16),
    ("Animations", 20),
    ("Gestures", 21),
];

/// An identity's inventory folders, root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySkeleton {
    pub root: FolderId,
    pub folders: Vec<FolderDescriptor>,
}

impl InventorySkeleton {
    /// A fresh root named "My Inventory" plus the [`STANDARD_FOLDERS`],
    /// all with new random ids.
    pub fn standard() -> Self {
        let root = FolderId::random();
        let mut folders = Vec::with_capacity(STANDARD_FOLDERS.len() + 1);
        folders.push(FolderDescriptor {
            folder_id: root,
            parent_id: FolderId::NIL,
            name: "My Inventory".into(),
            type_default: ROOT_FOLDER_TYPE,
            version: 1,
        });
        folders.extend(STANDARD_FOLDERS.iter().map(|&(name, kind)| FolderDescriptor {
            folder_id: FolderId::random(),
            parent_id: root,
            name: name.into(),
            type_default: kind,
            version: 1,
        }));
        Self { root, folders }
    }
}

/// Where inventory skeletons come from.
pub trait InventoryService: Send + Sync + 'static {
    /// Returns the skeleton for `owner`.
    fn fetch_skeleton(&self, owner: IdentityId) -> Result<InventorySkeleton, StoreError>;
}

/// An [`InventoryService`] kept in process memory.
///
/// An identity without an inventory gets a [`InventorySkeleton::standard`]
/// one the first time it is asked for, and the same one afterwards.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    skeletons: RwLock<HashMap<IdentityId, InventorySkeleton>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a skeleton for `owner`, replacing any existing one.
    pub fn insert(&self, owner: IdentityId, skeleton: InventorySkeleton) {
        self.skeletons.write().insert(owner, skeleton);
    }
}

impl InventoryService for MemoryInventory {
    fn fetch_skeleton(&self, owner: IdentityId) -> Result<InventorySkeleton, StoreError> {
        if let Some(existing) = self.skeletons.read().get(&owner) {
            return Ok(existing.clone());
        }
        let mut skeletons = self.skeletons.write();
        let skeleton = skeletons.entry(owner).or_insert_with(|| {
            tracing::debug!(%owner, "creating standard inventory");
            InventorySkeleton::standard()
        });
        Ok(skeleton.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_skeleton_has_root_first_and_children_under_it() {
        let skeleton = InventorySkeleton::standard();

        let root = &skeleton.folders[0];
        assert_eq!(root.folder_id, skeleton.root);
        assert_eq!(root.parent_id, FolderId::NIL);
        assert_eq!(root.name, "My Inventory");
        assert_eq!(skeleton.folders.len(), STANDARD_FOLDERS.len() + 1);
        assert!(skeleton.folders[1..].iter().all(|f| f.parent_id == skeleton.root));
    }

    #[test]
    fn test_fetch_skeleton_is_stable_per_owner() {
        let inventory = MemoryInventory::new();
        let owner = IdentityId::random();

        let first = inventory.fetch_skeleton(owner).unwrap();
        let second = inventory.fetch_skeleton(owner).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_fetch_skeleton_distinct_owners_get_distinct_roots() {
        let inventory = MemoryInventory::new();

        let a = inventory.fetch_skeleton(IdentityId::random()).unwrap();
        let b = inventory.fetch_skeleton(IdentityId::random()).unwrap();

        assert_ne!(a.root, b.root);
    }

    #[test]
    fn test_fetch_skeleton_returns_inserted_skeleton() {
        let inventory = MemoryInventory::new();
        let owner = IdentityId::random();
        let custom = InventorySkeleton {
            root: FolderId::random(),
            folders: Vec::new(),
        };
        inventory.insert(owner, custom.clone());

        assert_eq!(inventory.fetch_skeleton(owner).unwrap(), custom);
    }
}
