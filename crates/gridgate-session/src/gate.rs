//! The login lock.
//!
//! Every authenticate → resolve → commit sequence runs inside a
//! [`LoginPermit`]. While a permit is held no other login that maps to the
//! same gate slot can start, which makes "check for an online session, then
//! mint one" atomic. Slots are addressed by [`IdentityId`], never by name,
//! so however a store resolves names, one identity has exactly one slot.
//!
//! Two serialization modes:
//!
//! - [`LoginSerialization::Global`] (default): one slot for the whole
//!   process. Every login waits for every other login, whatever identity
//!   it targets.
//! - [`LoginSerialization::PerIdentity`]: one slot per identity id. Logins
//!   for the same identity still serialize; logins for different identities
//!   run side by side.
//!
//! The permit is a guard. Dropping it releases the slot, so the lock is
//! released on every exit path, unwinding included. The gate is not
//! reentrant: acquiring twice for the same slot from one task deadlocks.

use std::collections::HashMap;
use std::sync::Arc;

use gridgate_protocol::IdentityId;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

/// How concurrent logins are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginSerialization {
    #[default]
    Global,
    PerIdentity,
}

/// Process-wide mutual exclusion for login attempts.
#[derive(Debug, Default)]
pub struct LoginGate {
    mode: LoginSerialization,
    global: Mutex<()>,
    /// Per-identity slots, created on demand. Slots nobody holds or waits
    /// on are pruned on the next acquisition.
    slots: parking_lot::Mutex<HashMap<IdentityId, Arc<Mutex<()>>>>,
}

/// Proof that the holder may run one login. Releases on drop.
#[must_use = "the login lock is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct LoginPermit<'a> {
    _guard: PermitGuard<'a>,
}

#[derive(Debug)]
enum PermitGuard<'a> {
    Global(MutexGuard<'a, ()>),
    PerIdentity(OwnedMutexGuard<()>),
}

impl LoginGate {
    pub fn new(mode: LoginSerialization) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> LoginSerialization {
        self.mode
    }

    /// Waits until the slot for `id` is free and takes it.
    pub async fn acquire(&self, id: IdentityId) -> LoginPermit<'_> {
        let guard = match self.mode {
            LoginSerialization::Global => PermitGuard::Global(self.global.lock().await),
            LoginSerialization::PerIdentity => {
                PermitGuard::PerIdentity(self.slot(id).lock_owned().await)
            }
        };
        LoginPermit { _guard: guard }
    }

    /// Takes the slot for `id` only if it is free right now.
    pub fn try_acquire(&self, id: IdentityId) -> Option<LoginPermit<'_>> {
        let guard = match self.mode {
            LoginSerialization::Global => PermitGuard::Global(self.global.try_lock().ok()?),
            LoginSerialization::PerIdentity => {
                PermitGuard::PerIdentity(self.slot(id).try_lock_owned().ok()?)
            }
        };
        Some(LoginPermit { _guard: guard })
    }

    fn slot(&self, id: IdentityId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock();
        // Only the table holds a count-1 slot, so nobody is using it.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        Arc::clone(slots.entry(id).or_default())
    }
}
