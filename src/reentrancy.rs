//! Debug-only reentrancy detection for `StampedLock`.
//!
//! The lock is not reentrant: a thread that asks for a stamp while it already
//! holds one on the same lock would deadlock (a second writer waits on
//! itself; a nested reader can queue behind a waiting writer that in turn
//! waits on the outer read). In debug builds every outstanding stamp records
//! the thread that acquired it, and a second acquisition from that thread
//! panics before blocking. Stamps are `!Send`, so the recorded thread is
//! also the one that releases the stamp. In release builds this compiles to nothing.

#[cfg(debug_assertions)]
use parking_lot::Mutex;

/// Identity of the thread that acquired a stamp. Zero-sized in release builds.
#[cfg(debug_assertions)]
pub(crate) type OwnerTag = std::thread::ThreadId;
#[cfg(not(debug_assertions))]
pub(crate) type OwnerTag = ();

/// Per-lock set of threads currently holding a stamp.
#[derive(Debug)]
pub(crate) struct DebugOwners {
    #[cfg(debug_assertions)]
    held: Mutex<Vec<std::thread::ThreadId>>,
}

impl DebugOwners {
    pub(crate) fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            held: Mutex::new(Vec::new()),
        }
    }

    /// Register the current thread as a holder. Panics if it already holds a
    /// stamp on this lock.
    #[cfg(debug_assertions)]
    #[inline]
    pub(crate) fn enter(&self) -> OwnerTag {
        let me = std::thread::current().id();
        let mut held = self.held.lock();
        assert!(
            !held.contains(&me),
            "reentrancy detected: thread already holds a stamp on this lock"
        );
        held.push(me);
        me
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub(crate) fn enter(&self) -> OwnerTag {}

    /// Register the current thread without the reentrancy check. Used by
    /// non-blocking acquisitions, which cannot deadlock.
    #[cfg(debug_assertions)]
    #[inline]
    pub(crate) fn register(&self) -> OwnerTag {
        let me = std::thread::current().id();
        self.held.lock().push(me);
        me
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub(crate) fn register(&self) -> OwnerTag {}

    /// Forget one registration made by `enter`.
    #[cfg(debug_assertions)]
    #[inline]
    pub(crate) fn exit(&self, tag: OwnerTag) {
        let mut held = self.held.lock();
        let pos = held.iter().position(|t| *t == tag);
        debug_assert!(pos.is_some(), "stamp owner was not registered");
        if let Some(pos) = pos {
            held.swap_remove(pos);
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub(crate) fn exit(&self, _tag: OwnerTag) {}
}

impl Default for DebugOwners {
    fn default() -> Self {
        Self::new()
    }
}
