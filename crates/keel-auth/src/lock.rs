//! Session lock release discipline.
//!
//! A request that opened its session for writing holds a per-session lock
//! that serializes every other request of the same session. Read-only work
//! such as building the bootstrap payload should give the lock back as soon
//! as its results are computed, not when the response is flushed.
//!
//! [`SessionLockGuard`] makes that release explicit and exactly-once:
//!
//! ```text
//! acquire (session subsystem)  →  SessionLockGuard::new(lock)
//!                                     │ compute payload
//!                                     ▼
//!                                 guard.release()   (or Drop on error paths)
//! ```

/// A held session lock.
pub trait SessionLock: Send + Sync {
    /// Releases the lock. Called at most once per guard.
    fn release(&self);
}

/// Scoped ownership of a [`SessionLock`].
///
/// Release happens on [`release`](Self::release) or on drop, whichever
/// comes first, and never twice.
///
/// ```
/// use keel_auth::{SessionLock, SessionLockGuard};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// struct Counter(Arc<AtomicUsize>);
/// impl SessionLock for Counter {
///     fn release(&self) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
/// }
///
/// let releases = Arc::new(AtomicUsize::new(0));
/// let guard = SessionLockGuard::new(Some(Box::new(Counter(Arc::clone(&releases)))));
/// guard.release();
/// assert_eq!(releases.load(Ordering::SeqCst), 1);
/// ```
#[must_use = "dropping the guard immediately releases the session lock"]
pub struct SessionLockGuard {
    lock: Option<Box<dyn SessionLock>>,
}

impl SessionLockGuard {
    /// Takes ownership of a held lock. `None` means the session was never locked.
    pub fn new(lock: Option<Box<dyn SessionLock>>) -> Self {
        Self { lock }
    }

    /// Returns `true` while the lock has not been released.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.lock.is_some()
    }

    /// Releases the lock now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(lock) = self.lock.take() {
            lock.release();
            tracing::debug!("session lock released");
        }
    }
}

impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for SessionLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLockGuard")
            .field("held", &self.is_held())
            .finish()
    }
}
