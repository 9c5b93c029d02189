//! `GrantBuilder`: turns a freshly minted session into a [`LoginGrant`].
//!
//! Building happens in two steps so the caller can act in between:
//!
//! 1. [`assemble`](GrantBuilder::assemble): identifiers from the session,
//!    the inventory skeleton, the library, the buddy list, the welcome
//!    text. Fails only if a collaborator fails.
//! 2. [`customize`](GrantBuilder::customize): the deployment hook. Fails
//!    independently; the caller decides what that means for the client.
//!
//! [`build`](GrantBuilder::build) runs both.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use gridgate_protocol::{BuddyEntry, Destination, LoginGrant, StartLocation};
use gridgate_session::{Identity, Session};

use crate::{
    CustomizeError, FriendsStore, GrantCustomizer, GrantError, InventoryService, LibrarySource,
    NoCustomization, StaticLibrary,
};

/// Welcome text used when none is configured.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to gridgate";

/// Assembles login grants from the collaborators it was given.
///
/// Every hook is an `Arc<dyn ...>` so a deployment can swap one without
/// touching the others, and so the builder can be shared across tasks.
#[derive(Clone)]
pub struct GrantBuilder {
    inventory: Arc<dyn InventoryService>,
    friends: Arc<dyn FriendsStore>,
    library: Arc<dyn LibrarySource>,
    customizer: Arc<dyn GrantCustomizer>,
    welcome_message: String,
}

impl GrantBuilder {
    /// A builder with the default library, no customization, and the
    /// default welcome text.
    pub fn new(inventory: Arc<dyn InventoryService>, friends: Arc<dyn FriendsStore>) -> Self {
        Self {
            inventory,
            friends,
            library: Arc::new(StaticLibrary::default()),
            customizer: Arc::new(NoCustomization),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn library(mut self, library: Arc<dyn LibrarySource>) -> Self {
        self.library = library;
        self
    }

    pub fn customizer(mut self, customizer: Arc<dyn GrantCustomizer>) -> Self {
        self.customizer = customizer;
        self
    }

    pub fn welcome_message(mut self, message: impl Into<String>) -> Self {
        self.welcome_message = message.into();
        self
    }

    /// Builds the fixed part of the grant.
    ///
    /// # Errors
    /// [`GrantError::Store`] if the inventory or friends collaborator fails.
    pub fn assemble(&self, identity: &Identity, session: &Session) -> Result<LoginGrant, GrantError> {
        let inventory = self.inventory.fetch_skeleton(identity.id)?;
        let buddy_list: Vec<BuddyEntry> = self
            .friends
            .fetch_friends(identity.id)?
            .into_iter()
            .map(BuddyEntry::from)
            .collect();

        Ok(LoginGrant {
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            agent_id: identity.id,
            session_id: session.session_id,
            secure_session_id: session.secure_session_id,
            circuit_code: session.circuit_code,
            inventory_root: inventory.root,
            inventory_skeleton: inventory.folders,
            library_root: self.library.library_root(),
            library_owner: self.library.library_owner(),
            library_skeleton: self.library.library_skeleton(),
            buddy_list,
            message: self.welcome_message.clone(),
            destination: Destination::default(),
            extra: BTreeMap::new(),
        })
    }

    /// Runs the deployment customizer on `grant`.
    ///
    /// A panicking customizer is contained and reported as
    /// [`CustomizeError::Panicked`]. On error `grant` may be partly
    /// modified and should not be sent.
    pub fn customize(
        &self,
        grant: &mut LoginGrant,
        identity: &Identity,
        start: &StartLocation,
    ) -> Result<(), GrantError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.customizer.customize(grant, identity, start)
        }))
        .unwrap_or(Err(CustomizeError::Panicked));

        outcome.map_err(|e| {
            tracing::warn!(agent_id = %identity.id, %start, error = %e, "customization failed");
            GrantError::Customization(e)
        })
    }

    /// [`assemble`](Self::assemble) then [`customize`](Self::customize).
    pub fn build(&self, identity: &Identity, session: &Session) -> Result<LoginGrant, GrantError> {
        let mut grant = self.assemble(identity, session)?;
        self.customize(&mut grant, identity, &session.start_location)?;
        Ok(grant)
    }
}

impl std::fmt::Debug for GrantBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantBuilder")
            .field("welcome_message", &self.welcome_message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use gridgate_protocol::{IdentityId, StartLocation};
    use gridgate_session::StoreError;

    use super::*;
    use crate::{
        FriendEntry, InventorySkeleton, LIBRARY_OWNER, LIBRARY_ROOT, MemoryFriends,
        MemoryInventory,
    };

    // -- Helpers ----------------------------------------------------------

    struct BrokenInventory;

    impl InventoryService for BrokenInventory {
        fn fetch_skeleton(&self, _: IdentityId) -> Result<InventorySkeleton, StoreError> {
            Err(StoreError::new("inventory offline"))
        }
    }

    struct Refuse;

    impl GrantCustomizer for Refuse {
        fn customize(
            &self,
            _: &mut LoginGrant,
            _: &Identity,
            _: &StartLocation,
        ) -> Result<(), CustomizeError> {
            Err(CustomizeError::Unavailable("maintenance".into()))
        }
    }

    struct Explode;

    impl GrantCustomizer for Explode {
        fn customize(
            &self,
            _: &mut LoginGrant,
            _: &Identity,
            _: &StartLocation,
        ) -> Result<(), CustomizeError> {
            panic!("customizer bug");
        }
    }

    struct SetExtra;

    impl GrantCustomizer for SetExtra {
        fn customize(
            &self,
            grant: &mut LoginGrant,
            _: &Identity,
            _: &StartLocation,
        ) -> Result<(), CustomizeError> {
            grant.extra.insert("seconds_since_epoch".into(), 42.into());
            grant.destination.sim_port = 9000;
            Ok(())
        }
    }

    fn builder_with_friends(friends: MemoryFriends) -> GrantBuilder {
        GrantBuilder::new(Arc::new(MemoryInventory::new()), Arc::new(friends))
    }

    fn online() -> Session {
        Session::mint(StartLocation::Last)
    }

    // =====================================================================
    // assemble()
    // =====================================================================

    #[test]
    fn test_assemble_copies_session_and_identity_fields() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let session = online();
        let builder = builder_with_friends(MemoryFriends::new());

        let grant = builder.assemble(&identity, &session).unwrap();

        assert_eq!(grant.first_name, "Jane");
        assert_eq!(grant.last_name, "Doe");
        assert_eq!(grant.agent_id, identity.id);
        assert_eq!(grant.session_id, session.session_id);
        assert_eq!(grant.secure_session_id, session.secure_session_id);
        assert_eq!(grant.circuit_code, session.circuit_code);
        assert_eq!(grant.message, DEFAULT_WELCOME_MESSAGE);
    }

    #[test]
    fn test_assemble_includes_inventory_and_library() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let builder = builder_with_friends(MemoryFriends::new());

        let grant = builder.assemble(&identity, &online()).unwrap();

        assert!(!grant.inventory_skeleton.is_empty());
        assert_eq!(grant.inventory_skeleton[0].folder_id, grant.inventory_root);
        assert_eq!(grant.library_root, LIBRARY_ROOT);
        assert_eq!(grant.library_owner, LIBRARY_OWNER);
        assert!(!grant.library_skeleton.is_empty());
    }

    #[test]
    fn test_assemble_maps_friends_to_buddy_list_in_order() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let (john, jim) = (IdentityId::random(), IdentityId::random());
        let friends = MemoryFriends::new();
        friends.befriend(identity.id, john, 1, 3);
        friends.befriend(identity.id, jim, 0, 1);
        let expected: Vec<BuddyEntry> = friends
            .fetch_friends(identity.id)
            .unwrap()
            .into_iter()
            .map(BuddyEntry::from)
            .collect();

        let grant = builder_with_friends(friends)
            .assemble(&identity, &online())
            .unwrap();

        assert_eq!(grant.buddy_list, expected);
        assert_eq!(grant.buddy_list[0].buddy_id, john);
    }

    #[test]
    fn test_assemble_inventory_failure_is_store_error() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let builder = GrantBuilder::new(Arc::new(BrokenInventory), Arc::new(MemoryFriends::new()));

        let result = builder.assemble(&identity, &online());

        assert!(matches!(result, Err(GrantError::Store(_))));
    }

    #[test]
    fn test_assemble_uses_configured_welcome_message() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let builder = builder_with_friends(MemoryFriends::new()).welcome_message("Hello grid");

        let grant = builder.assemble(&identity, &online()).unwrap();

        assert_eq!(grant.message, "Hello grid");
    }

    // =====================================================================
    // customize() / build()
    // =====================================================================

    #[test]
    fn test_build_applies_customizer() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let builder = builder_with_friends(MemoryFriends::new()).customizer(Arc::new(SetExtra));

        let grant = builder.build(&identity, &online()).unwrap();

        assert_eq!(grant.extra["seconds_since_epoch"], 42);
        assert_eq!(grant.destination.sim_port, 9000);
    }

    #[test]
    fn test_build_customizer_refusal_is_customization_error() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let builder = builder_with_friends(MemoryFriends::new()).customizer(Arc::new(Refuse));

        let result = builder.build(&identity, &online());

        assert!(matches!(
            result,
            Err(GrantError::Customization(CustomizeError::Unavailable(_)))
        ));
    }

    #[test]
    fn test_build_customizer_panic_is_contained() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let builder = builder_with_friends(MemoryFriends::new()).customizer(Arc::new(Explode));

        let result = builder.build(&identity, &online());

        assert!(matches!(
            result,
            Err(GrantError::Customization(CustomizeError::Panicked))
        ));
    }

    #[test]
    fn test_friend_entry_rights_survive_into_grant() {
        let identity = Identity::new("Jane", "Doe", "pw");
        let friend = IdentityId::random();
        let friends = MemoryFriends::new();
        friends.befriend(identity.id, friend, 7, 2);

        let grant = builder_with_friends(friends)
            .build(&identity, &online())
            .unwrap();

        let entry = FriendEntry { friend, friend_rights: 7, owner_rights: 2 };
        assert_eq!(grant.buddy_list, vec![BuddyEntry::from(entry)]);
    }
}
