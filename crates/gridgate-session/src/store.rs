//! The identity store collaborator.
//!
//! Persistence of identities and sessions lives outside the broker. The
//! arbiter only needs three calls, captured by [`IdentityStore`]. Calls are
//! synchronous and made while the login lock is held, so an implementation
//! must never block indefinitely: a stuck store stalls every login.

use std::collections::HashMap;

use gridgate_protocol::{IdentityId, NamePair};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{Identity, StoreError};

/// Where identities and their sessions are read from and written to.
pub trait IdentityStore: Send + Sync + 'static {
    /// Finds an identity by name pair. `Ok(None)` means "no such identity",
    /// `Err` means the store itself failed.
    fn lookup_identity(&self, name: &NamePair) -> Result<Option<Identity>, StoreError>;

    /// Persists the identity's session state and inventory root.
    fn commit_session(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Replaces the identity's web login key.
    fn store_web_login_key(&self, id: IdentityId, key: Uuid) -> Result<(), StoreError>;
}

/// An [`IdentityStore`] kept in process memory.
///
/// Suitable for single-node deployments, demos, and tests. Name lookups
/// are case-insensitive.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    by_id: HashMap<IdentityId, Identity>,
    /// Case-folded name key to id. Kept in sync with `by_id`.
    by_name: HashMap<String, IdentityId>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an identity.
    pub fn insert(&self, identity: Identity) {
        let mut tables = self.inner.write();
        if let Some(previous) = tables.by_id.get(&identity.id) {
            let stale_key = previous.name().lookup_key();
            tables.by_name.remove(&stale_key);
        }
        tables
            .by_name
            .insert(identity.name().lookup_key(), identity.id);
        tables.by_id.insert(identity.id, identity);
    }

    /// Snapshot of an identity by id.
    pub fn get(&self, id: IdentityId) -> Option<Identity> {
        self.inner.read().by_id.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn lookup_identity(&self, name: &NamePair) -> Result<Option<Identity>, StoreError> {
        let tables = self.inner.read();
        Ok(tables
            .by_name
            .get(&name.lookup_key())
            .and_then(|id| tables.by_id.get(id))
            .cloned())
    }

    fn commit_session(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut tables = self.inner.write();
        let stored = tables
            .by_id
            .get_mut(&identity.id)
            .ok_or_else(|| StoreError::new(format!("unknown identity {}", identity.id)))?;
        stored.current_session = identity.current_session.clone();
        stored.inventory_root = identity.inventory_root;
        Ok(())
    }

    fn store_web_login_key(&self, id: IdentityId, key: Uuid) -> Result<(), StoreError> {
        let mut tables = self.inner.write();
        let stored = tables
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::new(format!("unknown identity {id}")))?;
        stored.web_login_key = key;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use gridgate_protocol::StartLocation;

    use super::*;
    use crate::Session;

    #[test]
    fn test_lookup_identity_is_case_insensitive() {
        let store = MemoryIdentityStore::new();
        let identity = Identity::new("Jane", "Doe", "pw");
        let id = identity.id;
        store.insert(identity);

        let found = store
            .lookup_identity(&NamePair::new("JANE", "doe"))
            .unwrap()
            .expect("should find identity");
        assert_eq!(found.id, id);
    }

    #[test]
    fn test_lookup_identity_unknown_returns_none() {
        let store = MemoryIdentityStore::new();
        let found = store.lookup_identity(&NamePair::new("No", "One")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_insert_renamed_identity_drops_old_name() {
        let store = MemoryIdentityStore::new();
        let mut identity = Identity::new("Jane", "Doe", "pw");
        store.insert(identity.clone());

        identity.last_name = "Smith".into();
        store.insert(identity);

        assert_eq!(store.len(), 1);
        assert!(store.lookup_identity(&NamePair::new("Jane", "Doe")).unwrap().is_none());
        assert!(store.lookup_identity(&NamePair::new("Jane", "Smith")).unwrap().is_some());
    }

    #[test]
    fn test_commit_session_persists_session_only() {
        let store = MemoryIdentityStore::new();
        let identity = Identity::new("Jane", "Doe", "pw");
        let original_hash = identity.password_hash.clone();
        store.insert(identity.clone());

        let mut changed = identity;
        changed.current_session = Some(Session::mint(StartLocation::Last));
        changed.password_hash = "tampered".into();
        store.commit_session(&changed).unwrap();

        let stored = store.get(changed.id).unwrap();
        assert!(stored.is_online());
        assert_eq!(stored.password_hash, original_hash);
    }

    #[test]
    fn test_commit_session_unknown_identity_fails() {
        let store = MemoryIdentityStore::new();
        let result = store.commit_session(&Identity::new("Ghost", "User", "pw"));
        assert!(result.is_err());
    }

    #[test]
    fn test_store_web_login_key_replaces_key() {
        let store = MemoryIdentityStore::new();
        let identity = Identity::new("Jane", "Doe", "pw");
        let id = identity.id;
        store.insert(identity);

        let key = Uuid::new_v4();
        store.store_web_login_key(id, key).unwrap();

        assert_eq!(store.get(id).unwrap().web_login_key, key);
    }
}
