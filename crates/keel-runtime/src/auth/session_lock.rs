//! Per-session exclusive locks.
//!
//! Requests of the same session are serialized while one of them holds
//! the session open for writing. [`SessionLockTable`] tracks which
//! session ids are locked; [`HeldSessionLock`] is the handle that gives
//! the id back.

use keel_auth::SessionLock;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Table of currently locked session ids.
#[derive(Debug, Default)]
pub struct SessionLockTable {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl SessionLockTable {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks until `session_id` is free, then locks it.
    pub fn acquire(self: &Arc<Self>, session_id: impl Into<String>) -> HeldSessionLock {
        let session_id = session_id.into();
        let mut held = self.held.lock();
        while held.contains(&session_id) {
            self.released.wait(&mut held);
        }
        held.insert(session_id.clone());
        trace!(session = %session_id, "Session lock acquired");

        HeldSessionLock {
            table: Arc::clone(self),
            session_id,
        }
    }

    /// Locks `session_id` if it is free.
    pub fn try_acquire(self: &Arc<Self>, session_id: impl Into<String>) -> Option<HeldSessionLock> {
        let session_id = session_id.into();
        let mut held = self.held.lock();
        if !held.insert(session_id.clone()) {
            return None;
        }

        Some(HeldSessionLock {
            table: Arc::clone(self),
            session_id,
        })
    }

    /// Returns `true` if `session_id` is locked.
    #[must_use]
    pub fn is_locked(&self, session_id: &str) -> bool {
        self.held.lock().contains(session_id)
    }

    fn unlock(&self, session_id: &str) {
        if self.held.lock().remove(session_id) {
            trace!(session = %session_id, "Session lock released");
            self.released.notify_all();
        }
    }
}

/// A lock on one session id, released through [`SessionLock::release`].
///
/// Not released on drop; wrap it in a `SessionLockGuard` for that.
#[derive(Debug)]
pub struct HeldSessionLock {
    table: Arc<SessionLockTable>,
    session_id: String,
}

impl HeldSessionLock {
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl SessionLock for HeldSessionLock {
    fn release(&self) {
        self.table.unlock(&self.session_id);
    }
}
