//! Linear lock stamps.
//!
//! A stamp is the proof that a `StampedLock` was acquired in a given mode.
//! Stamps cannot be cloned, carry the identity of the lock that minted them
//! and the write epoch they belong to, and must be handed back through the
//! matching `read_unlock`/`write_unlock`. Dropping a stamp any other way
//! panics: the lock would otherwise stay held forever.
//!
//! Stamps are `!Send`: a stamp is released on the thread that acquired it,
//! which is also the thread the debug reentrancy check has recorded.
//!
//! ```compile_fail
//! use stamped_collections::StampedLock;
//! use std::sync::Arc;
//!
//! let lock = Arc::new(StampedLock::new());
//! let r = lock.read_lock();
//! let l2 = lock.clone();
//! std::thread::spawn(move || l2.read_unlock(r));
//! ```

use crate::reentrancy::OwnerTag;
use core::fmt;
use core::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// Lock mode a stamp was acquired in.
pub trait Mode: sealed::Sealed {
    const NAME: &'static str;
}

/// Shared mode marker.
#[derive(Debug)]
pub enum Read {}

/// Exclusive mode marker.
#[derive(Debug)]
pub enum Write {}

impl sealed::Sealed for Read {}
impl sealed::Sealed for Write {}

impl Mode for Read {
    const NAME: &'static str = "read";
}

impl Mode for Write {
    const NAME: &'static str = "write";
}

pub type ReadStamp = Stamp<Read>;
pub type WriteStamp = Stamp<Write>;

/// Opaque token returned by a lock acquisition.
#[must_use = "a stamp must be returned to its lock, dropping it panics"]
pub struct Stamp<M: Mode> {
    lock_id: u64,
    epoch: u64,
    pub(crate) owner: OwnerTag,
    _mode: PhantomData<M>,
    // Keep !Send + !Sync: ownership is tracked per acquiring thread.
    _nosend: PhantomData<*const ()>,
}

impl<M: Mode> Stamp<M> {
    pub(crate) fn new(lock_id: u64, epoch: u64, owner: OwnerTag) -> Self {
        Self {
            lock_id,
            epoch,
            owner,
            _mode: PhantomData,
            _nosend: PhantomData,
        }
    }

    /// Identity of the lock that minted this stamp.
    #[inline]
    pub fn lock_id(&self) -> u64 {
        self.lock_id
    }

    /// Write epoch this stamp was minted in. For a write stamp this is the
    /// epoch it opened; for a read stamp, the last epoch that had begun when
    /// the read lock was taken.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Consume the stamp without running its drop check. Used by the lock
    /// once the stamp has been validated and released.
    #[inline]
    pub(crate) fn consume(self) -> (u64, u64, OwnerTag) {
        let parts = (self.lock_id, self.epoch, self.owner);
        core::mem::forget(self);
        parts
    }
}

impl<M: Mode> fmt::Debug for Stamp<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stamp")
            .field("mode", &M::NAME)
            .field("lock_id", &self.lock_id)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl<M: Mode> Drop for Stamp<M> {
    fn drop(&mut self) {
        // Fail fast on unbalanced locking; stay quiet while already unwinding
        // so the original panic is the one reported.
        if !std::thread::panicking() {
            panic!("{} stamp dropped without unlock", M::NAME);
        }
    }
}
