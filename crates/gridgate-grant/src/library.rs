//! The shared inventory library every identity sees.

use gridgate_protocol::{FolderDescriptor, FolderId, IdentityId};
use uuid::Uuid;

use crate::inventory::ROOT_FOLDER_TYPE;

/// Root folder of the default library.
pub const LIBRARY_ROOT: FolderId =
    FolderId(Uuid::from_u128(0x00000112_000f_0000_0000_000100bba000));

/// Identity that owns the default library.
pub const LIBRARY_OWNER: IdentityId =
    IdentityId(Uuid::from_u128(0x11111111_1111_0000_0000_000100bba000));

/// Supplies the library part of a grant. Deployments with their own
/// library contents implement this; everyone else uses [`StaticLibrary`].
pub trait LibrarySource: Send + Sync + 'static {
    fn library_root(&self) -> FolderId;
    fn library_owner(&self) -> IdentityId;
    fn library_skeleton(&self) -> Vec<FolderDescriptor>;
}

/// A fixed library whose folders never change.
#[derive(Debug, Clone)]
pub struct StaticLibrary {
    root: FolderId,
    owner: IdentityId,
    folders: Vec<FolderDescriptor>,
}

impl StaticLibrary {
    pub fn new(root: FolderId, owner: IdentityId, folders: Vec<FolderDescriptor>) -> Self {
        Self { root, owner, folders }
    }
}

impl Default for StaticLibrary {
    /// The default library: a root under [`LIBRARY_ROOT`] with a handful of
    /// typed child folders. Child ids count up from the root id so they are
    /// the same on every run.
    fn default() -> Self {
        const CHILDREN: &[(&str, i32)] = &[
            ("Textures", 0),
            ("Clothing", 5),
            ("Objects", 6),
            ("Notecards", 7),
            ("Scripts", 10),
            ("Body Parts", 13),
            ("Animations", 20),
            ("Gestures", 21),
        ];

        let base = LIBRARY_ROOT.0.as_u128();
        let mut folders = vec![FolderDescriptor {
            folder_id: LIBRARY_ROOT,
            parent_id: FolderId::NIL,
            name: "Library".into(),
            type_default: ROOT_FOLDER_TYPE,
            version: 1,
        }];
        folders.extend(CHILDREN.iter().zip(1u128..).map(|(&(name, kind), n)| {
            FolderDescriptor {
                folder_id: FolderId(Uuid::from_u128(base + n)),
                parent_id: LIBRARY_ROOT,
                name: name.into(),
                type_default: kind,
                version: 1,
            }
        }));

        Self::new(LIBRARY_ROOT, LIBRARY_OWNER, folders)
    }
}

impl LibrarySource for StaticLibrary {
    fn library_root(&self) -> FolderId {
        self.root
    }

    fn library_owner(&self) -> IdentityId {
        self.owner
    }

    fn library_skeleton(&self) -> Vec<FolderDescriptor> {
        self.folders.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_constants_render_as_expected() {
        assert_eq!(LIBRARY_ROOT.to_string(), "00000112-000f-0000-0000-000100bba000");
        assert_eq!(LIBRARY_OWNER.to_string(), "11111111-1111-0000-0000-000100bba000");
    }

    #[test]
    fn test_default_library_is_deterministic_and_rooted() {
        let a = StaticLibrary::default();
        let b = StaticLibrary::default();

        assert_eq!(a.library_skeleton(), b.library_skeleton());
        assert_eq!(a.library_root(), LIBRARY_ROOT);
        assert_eq!(a.library_owner(), LIBRARY_OWNER);

        let skeleton = a.library_skeleton();
        assert_eq!(skeleton[0].folder_id, LIBRARY_ROOT);
        assert!(skeleton[1..].iter().all(|f| f.parent_id == LIBRARY_ROOT));
    }
}
