//! Login grant assembly for gridgate.
//!
//! Once the session layer has admitted an identity, this crate builds what
//! the client receives: identifiers, inventory and library skeletons, the
//! buddy list, the welcome text, and whatever the deployment adds.
//!
//! The variable parts are strategy traits, injected into a
//! [`GrantBuilder`]:
//!
//! | Hook                 | Default                 |
//! |----------------------|-------------------------|
//! | [`InventoryService`] | [`MemoryInventory`]     |
//! | [`FriendsStore`]     | [`MemoryFriends`]       |
//! | [`LibrarySource`]    | [`StaticLibrary`]       |
//! | [`GrantCustomizer`]  | [`NoCustomization`], or [`RegionDirectory`] |

mod builder;
mod customize;
mod error;
mod friends;
mod inventory;
mod library;

pub use builder::{DEFAULT_WELCOME_MESSAGE, GrantBuilder};
pub use customize::{
    CustomizeError, GrantCustomizer, NoCustomization, REGION_SIZE, RegionDirectory, RegionInfo,
};
pub use error::GrantError;
pub use friends::{FriendEntry, FriendsStore, MemoryFriends};
pub use inventory::{
    InventoryService, InventorySkeleton, MemoryInventory, ROOT_FOLDER_TYPE, STANDARD_FOLDERS,
};
pub use library::{LIBRARY_OWNER, LIBRARY_ROOT, LibrarySource, StaticLibrary};
