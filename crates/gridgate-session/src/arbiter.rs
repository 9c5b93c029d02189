//! The session arbiter: owns "at most one online session per identity".
//!
//! For one login attempt the arbiter:
//!
//! 1. resolves the name pair to an identity id and takes that identity's
//!    login lock ([`LoginGate`]),
//! 2. reads the identity again under the lock,
//! 3. verifies the credential,
//! 4. if the identity is already online, forces that session offline,
//!    persists it, and rejects this attempt with `AlreadyLoggedIn`,
//! 5. otherwise mints a new online session and persists it.
//!
//! Steps 2–5 run under the lock, so the online check and the mint are
//! atomic with respect to every other login. On success the lock is *not*
//! released yet: it travels inside the returned [`Admission`] so the grant
//! can be assembled under the same lock. Dropping the admission releases it.
//!
//! # Conflicts
//!
//! A conflicting login does not take over the old session. The stale
//! session is cleared so that the client's *next* attempt succeeds; this
//! attempt is refused. No retry happens here.

use std::sync::Arc;

use gridgate_protocol::{FolderId, LoginRequest, NamePair};
use uuid::Uuid;

use crate::{
    Authenticator, CredentialAuthenticator, Identity, IdentityStore, LoginGate, LoginPermit,
    LoginSerialization, Session, SessionError,
};

/// Decides the session fate of login attempts.
pub struct SessionArbiter<S, A = CredentialAuthenticator> {
    store: Arc<S>,
    auth: A,
    gate: LoginGate,
}

/// A successful arbitration: the identity is online with a fresh session
/// and the login lock is still held.
///
/// Build the grant while holding this, then drop it.
pub struct Admission<'a, S> {
    identity: Identity,
    session: Session,
    store: &'a S,
    _permit: LoginPermit<'a>,
}

impl<S, A> SessionArbiter<S, A>
where
    S: IdentityStore,
    A: Authenticator,
{
    pub fn new(store: Arc<S>, auth: A, serialization: LoginSerialization) -> Self {
        Self {
            store,
            auth,
            gate: LoginGate::new(serialization),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn gate(&self) -> &LoginGate {
        &self.gate
    }

    /// Runs arbitration for one validated request.
    ///
    /// # Errors
    /// - [`SessionError::IdentityNotFound`]: no such name pair.
    /// - [`SessionError::AuthenticationFailed`]: wrong password or token.
    /// - [`SessionError::AlreadyLoggedIn`]: an online session existed and
    ///   has now been forced offline.
    /// - [`SessionError::Store`]: the identity store failed.
    pub async fn admit(&self, request: &LoginRequest) -> Result<Admission<'_, S>, SessionError> {
        let name = &request.name;
        let (permit, mut identity) = self.lock_identity(name).await?;

        if !self.auth.verify(&identity, &request.credential) {
            tracing::info!(%name, "authentication failed");
            return Err(SessionError::AuthenticationFailed(name.clone()));
        }

        if let Some(stale) = identity.current_session.as_mut().filter(|s| s.online) {
            stale.online = false;
            let stale_id = stale.session_id;
            self.store.commit_session(&identity)?;
            tracing::info!(
                %name,
                agent_id = %identity.id,
                session_id = %stale_id,
                "forced existing session offline, rejecting login"
            );
            return Err(SessionError::AlreadyLoggedIn(name.clone()));
        }

        let session = Session::mint(request.start.clone());
        identity.current_session = Some(session.clone());
        self.store.commit_session(&identity)?;

        tracing::info!(
            %name,
            agent_id = %identity.id,
            session_id = %session.session_id,
            circuit_code = session.circuit_code,
            "session minted"
        );

        Ok(Admission {
            identity,
            session,
            store: &*self.store,
            _permit: permit,
        })
    }

    /// Takes the gate slot for the identity `name` resolves to and returns
    /// that identity as read under the slot. If the store resolves `name`
    /// to a different identity in between, the slot is exchanged for the
    /// new one and the read repeated.
    async fn lock_identity(
        &self,
        name: &NamePair,
    ) -> Result<(LoginPermit<'_>, Identity), SessionError> {
        let mut id = self.find(name)?.id;
        loop {
            let permit = self.gate.acquire(id).await;
            let identity = self.find(name)?;
            if identity.id == id {
                return Ok((permit, identity));
            }
            id = identity.id;
        }
    }

    fn find(&self, name: &NamePair) -> Result<Identity, SessionError> {
        self.store
            .lookup_identity(name)?
            .ok_or_else(|| SessionError::IdentityNotFound(name.clone()))
    }

    /// Verifies a password and issues a fresh web login key for the
    /// identity, replacing any previous one.
    ///
    /// Runs outside the login lock: it never touches session state.
    ///
    /// # Errors
    /// `IdentityNotFound`, `AuthenticationFailed`, or `Store`.
    pub fn issue_web_login_key(&self, name: &NamePair, password: &str) -> Result<Uuid, SessionError> {
        let identity = self.find(name)?;

        if !CredentialAuthenticator::verify_password(&identity, password) {
            tracing::info!(%name, "web login key refused");
            return Err(SessionError::AuthenticationFailed(name.clone()));
        }

        let key = Uuid::new_v4();
        self.store.store_web_login_key(identity.id, key)?;
        tracing::info!(%name, agent_id = %identity.id, "web login key issued");
        Ok(key)
    }
}

impl<S: IdentityStore> Admission<'_, S> {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Records the identity's inventory root and persists it.
    pub fn record_inventory_root(&mut self, root: FolderId) -> Result<(), SessionError> {
        self.identity.inventory_root = Some(root);
        self.store.commit_session(&self.identity)?;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionArbiter`, named
    //! `test_{function}_{scenario}_{expected}`.

    use gridgate_protocol::{Credential, IdentityId, StartLocation};

    use super::*;
    use crate::{MemoryIdentityStore, StoreError};

    // -- Helpers ----------------------------------------------------------

    fn arbiter_with(identity: Identity) -> SessionArbiter<MemoryIdentityStore> {
        let store = MemoryIdentityStore::new();
        store.insert(identity);
        SessionArbiter::new(
            Arc::new(store),
            CredentialAuthenticator,
            LoginSerialization::Global,
        )
    }

    fn request(first: &str, last: &str, password: &str) -> LoginRequest {
        LoginRequest {
            name: NamePair::new(first, last),
            credential: Credential::Password(password.into()),
            start: StartLocation::Last,
            client_version: None,
        }
    }

    fn stored(arbiter: &SessionArbiter<MemoryIdentityStore>, id: IdentityId) -> Identity {
        arbiter.store().get(id).expect("identity should be stored")
    }

    /// A store whose writes always fail.
    struct BrokenStore(MemoryIdentityStore);

    impl IdentityStore for BrokenStore {
        fn lookup_identity(&self, name: &NamePair) -> Result<Option<Identity>, StoreError> {
            self.0.lookup_identity(name)
        }
        fn commit_session(&self, _: &Identity) -> Result<(), StoreError> {
            Err(StoreError::new("disk full"))
        }
        fn store_web_login_key(&self, _: IdentityId, _: Uuid) -> Result<(), StoreError> {
            Err(StoreError::new("disk full"))
        }
    }

    /// A store that ignores surrounding whitespace in names, so several
    /// spellings reach one identity.
    struct TrimmingStore(MemoryIdentityStore);

    impl IdentityStore for TrimmingStore {
        fn lookup_identity(&self, name: &NamePair) -> Result<Option<Identity>, StoreError> {
            self.0
                .lookup_identity(&NamePair::new(name.first.trim(), name.last.trim()))
        }
        fn commit_session(&self, identity: &Identity) -> Result<(), StoreError> {
            self.0.commit_session(identity)
        }
        fn store_web_login_key(&self, id: IdentityId, key: Uuid) -> Result<(), StoreError> {
            self.0.store_web_login_key(id, key)
        }
    }

    // =====================================================================
    // admit()
    // =====================================================================

    #[tokio::test]
    async fn test_admit_correct_password_mints_online_session() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);

        let admission = arbiter
            .admit(&request("Jane", "Doe", "secret"))
            .await
            .expect("should admit");

        assert!(admission.session().online);
        assert_eq!(admission.identity().id, id);
        let session_id = admission.session().session_id;
        drop(admission);

        let persisted = stored(&arbiter, id);
        assert!(persisted.is_online());
        assert_eq!(persisted.current_session.unwrap().session_id, session_id);
    }

    #[tokio::test]
    async fn test_admit_unknown_identity_returns_not_found() {
        let arbiter = arbiter_with(Identity::new("Jane", "Doe", "secret"));

        let result = arbiter.admit(&request("John", "Roe", "secret")).await;

        assert!(matches!(result, Err(SessionError::IdentityNotFound(n)) if n.first == "John"));
    }

    #[tokio::test]
    async fn test_admit_wrong_password_returns_auth_failed_and_stays_offline() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);

        let result = arbiter.admit(&request("Jane", "Doe", "guess")).await;

        assert!(matches!(result, Err(SessionError::AuthenticationFailed(_))));
        assert!(!stored(&arbiter, id).is_online());
    }

    #[tokio::test]
    async fn test_admit_already_online_forces_offline_and_rejects() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);
        drop(arbiter.admit(&request("Jane", "Doe", "secret")).await.unwrap());

        let result = arbiter.admit(&request("Jane", "Doe", "secret")).await;

        assert!(matches!(result, Err(SessionError::AlreadyLoggedIn(_))));
        let persisted = stored(&arbiter, id);
        assert!(persisted.current_session.is_some(), "session record is kept");
        assert!(!persisted.is_online(), "stale session must be offline");
    }

    #[tokio::test]
    async fn test_admit_retry_after_conflict_succeeds_with_new_session() {
        let arbiter = arbiter_with(Identity::new("Jane", "Doe", "secret"));
        let first = arbiter.admit(&request("Jane", "Doe", "secret")).await.unwrap();
        let first_session = first.session().session_id;
        drop(first);
        let _ = arbiter.admit(&request("Jane", "Doe", "secret")).await;

        let retry = arbiter
            .admit(&request("Jane", "Doe", "secret"))
            .await
            .expect("retry after cleanup should succeed");

        assert_ne!(retry.session().session_id, first_session);
    }

    #[tokio::test]
    async fn test_admit_wrong_password_does_not_clear_online_session() {
        // Only an authenticated attempt may force a session offline.
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);
        drop(arbiter.admit(&request("Jane", "Doe", "secret")).await.unwrap());

        let result = arbiter.admit(&request("Jane", "Doe", "guess")).await;

        assert!(matches!(result, Err(SessionError::AuthenticationFailed(_))));
        assert!(stored(&arbiter, id).is_online());
    }

    #[tokio::test]
    async fn test_admit_holds_lock_until_admission_dropped() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);

        let admission = arbiter.admit(&request("Jane", "Doe", "secret")).await.unwrap();
        assert!(arbiter.gate().try_acquire(id).is_none());

        drop(admission);
        assert!(arbiter.gate().try_acquire(id).is_some());
    }

    #[tokio::test]
    async fn test_admit_releases_lock_on_rejection() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);

        let _ = arbiter.admit(&request("Jane", "Doe", "wrong")).await;

        assert!(arbiter.gate().try_acquire(id).is_some());
    }

    #[tokio::test]
    async fn test_admit_per_identity_aliased_names_share_one_slot() {
        let inner = MemoryIdentityStore::new();
        inner.insert(Identity::new("Jane", "Doe", "secret"));
        let arbiter = SessionArbiter::new(
            Arc::new(TrimmingStore(inner)),
            CredentialAuthenticator,
            LoginSerialization::PerIdentity,
        );

        let admission = arbiter.admit(&request("Jane", "Doe", "secret")).await.unwrap();
        let aliased = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            arbiter.admit(&request(" Jane ", "Doe ", "secret")),
        )
        .await;
        assert!(aliased.is_err(), "an alias of a locked identity must wait");

        drop(admission);
        let retry = arbiter.admit(&request(" Jane ", "Doe ", "secret")).await;
        assert!(matches!(retry, Err(SessionError::AlreadyLoggedIn(_))));
    }

    #[tokio::test]
    async fn test_admit_store_failure_returns_store_error() {
        let inner = MemoryIdentityStore::new();
        inner.insert(Identity::new("Jane", "Doe", "secret"));
        let arbiter = SessionArbiter::new(
            Arc::new(BrokenStore(inner)),
            CredentialAuthenticator,
            LoginSerialization::Global,
        );

        let result = arbiter.admit(&request("Jane", "Doe", "secret")).await;

        assert!(matches!(result, Err(SessionError::Store(_))));
        assert!(arbiter.gate().try_acquire(IdentityId::random()).is_some());
    }

    #[tokio::test]
    async fn test_record_inventory_root_persists_root() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);
        let root = FolderId::random();

        let mut admission = arbiter.admit(&request("Jane", "Doe", "secret")).await.unwrap();
        admission.record_inventory_root(root).unwrap();
        drop(admission);

        assert_eq!(stored(&arbiter, id).inventory_root, Some(root));
    }

    // =====================================================================
    // issue_web_login_key()
    // =====================================================================

    #[tokio::test]
    async fn test_issue_web_login_key_then_token_login_succeeds() {
        let arbiter = arbiter_with(Identity::new("Jane", "Doe", "secret"));
        let name = NamePair::new("Jane", "Doe");

        let key = arbiter.issue_web_login_key(&name, "secret").unwrap();

        let token_request = LoginRequest {
            credential: Credential::Token(key.to_string()),
            ..request("Jane", "Doe", "")
        };
        assert!(arbiter.admit(&token_request).await.is_ok());
    }

    #[test]
    fn test_issue_web_login_key_wrong_password_keeps_old_key() {
        let identity = Identity::new("Jane", "Doe", "secret");
        let id = identity.id;
        let arbiter = arbiter_with(identity);

        let result = arbiter.issue_web_login_key(&NamePair::new("Jane", "Doe"), "nope");

        assert!(matches!(result, Err(SessionError::AuthenticationFailed(_))));
        assert!(stored(&arbiter, id).web_login_key.is_nil());
    }

    #[test]
    fn test_issue_web_login_key_twice_replaces_key() {
        let arbiter = arbiter_with(Identity::new("Jane", "Doe", "secret"));
        let name = NamePair::new("Jane", "Doe");

        let first = arbiter.issue_web_login_key(&name, "secret").unwrap();
        let second = arbiter.issue_web_login_key(&name, "secret").unwrap();

        assert_ne!(first, second);
    }
}
