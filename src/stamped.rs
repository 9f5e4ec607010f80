//! Stamped<C>: a value protected by a `StampedLock`.
//!
//! Two ways in:
//! - Guards: `read()`/`write()` return RAII guards that release on drop.
//! - Stamps: `read_lock()`/`write_lock()` return linear stamps; the value is
//!   reached through `view(&stamp)` or `view_mut(&mut write_stamp)` and the
//!   stamp is handed back via `read_unlock`/`write_unlock`.
//!
//! Either way, shared references exist only while a read or write stamp is
//! live, and a mutable reference only while the single write stamp is
//! mutably borrowed.

use crate::stamp::{Mode, ReadStamp, Stamp, WriteStamp};
use crate::stamped_lock::StampedLock;
use core::cell::UnsafeCell;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

pub struct Stamped<C> {
    lock: StampedLock,
    value: UnsafeCell<C>,
}

// SAFETY: access to `value` is mediated by `lock` exactly as in `RwLock`:
// shared references under read stamps, a unique reference under the write stamp.
unsafe impl<C: Send> Send for Stamped<C> {}
unsafe impl<C: Send + Sync> Sync for Stamped<C> {}

impl<C> Stamped<C> {
    pub fn new(value: C) -> Self {
        Self {
            lock: StampedLock::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// The underlying lock, for inspection or for raw stamp handling.
    pub fn lock(&self) -> &StampedLock {
        &self.lock
    }

    pub fn read(&self) -> ReadGuard<'_, C> {
        ReadGuard {
            owner: self,
            stamp: ManuallyDrop::new(self.lock.read_lock()),
        }
    }

    pub fn try_read(&self) -> Option<ReadGuard<'_, C>> {
        let stamp = self.lock.try_read_lock()?;
        Some(ReadGuard {
            owner: self,
            stamp: ManuallyDrop::new(stamp),
        })
    }

    pub fn write(&self) -> WriteGuard<'_, C> {
        WriteGuard {
            owner: self,
            stamp: ManuallyDrop::new(self.lock.write_lock()),
        }
    }

    pub fn try_write(&self) -> Option<WriteGuard<'_, C>> {
        let stamp = self.lock.try_write_lock()?;
        Some(WriteGuard {
            owner: self,
            stamp: ManuallyDrop::new(stamp),
        })
    }

    pub fn read_lock(&self) -> ReadStamp {
        self.lock.read_lock()
    }

    pub fn read_unlock(&self, stamp: ReadStamp) {
        self.lock.read_unlock(stamp)
    }

    pub fn write_lock(&self) -> WriteStamp {
        self.lock.write_lock()
    }

    pub fn write_unlock(&self, stamp: WriteStamp) {
        self.lock.write_unlock(stamp)
    }

    /// Shared access under any live stamp of this lock.
    ///
    /// Panics if the stamp was minted by a different lock.
    pub fn view<'a, M: Mode>(&'a self, stamp: &'a Stamp<M>) -> &'a C {
        self.check_stamp(stamp);
        // SAFETY: a live stamp of this lock excludes writers other than its
        // own holder, and the holder cannot obtain `&mut C` while `stamp` is
        // borrowed here.
        unsafe { &*self.value.get() }
    }

    /// Exclusive access under the live write stamp of this lock.
    ///
    /// Panics if the stamp was minted by a different lock.
    pub fn view_mut<'a>(&'a self, stamp: &'a mut WriteStamp) -> &'a mut C {
        self.check_stamp(stamp);
        // SAFETY: the write stamp is unique for this lock and is mutably
        // borrowed for 'a, so no other reference to the value can coexist.
        unsafe { &mut *self.value.get() }
    }

    fn check_stamp<M: Mode>(&self, stamp: &Stamp<M>) {
        assert_eq!(
            stamp.lock_id(),
            self.lock.id(),
            "{} stamp used with a different lock",
            M::NAME
        );
    }

    /// Unsynchronized access; `&mut self` already rules out other holders.
    pub fn get_mut(&mut self) -> &mut C {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> C {
        self.value.into_inner()
    }
}

impl<C: Default> Default for Stamped<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C> From<C> for Stamped<C> {
    fn from(value: C) -> Self {
        Self::new(value)
    }
}

impl<C: fmt::Debug> fmt::Debug for Stamped<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Stamped");
        match self.try_read() {
            Some(g) => d.field("value", &&*g),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.finish()
    }
}

/// Shared access to a `Stamped` value; releases the read stamp on drop.
pub struct ReadGuard<'a, C> {
    owner: &'a Stamped<C>,
    stamp: ManuallyDrop<ReadStamp>,
}

impl<'a, C> ReadGuard<'a, C> {
    pub fn epoch(&self) -> u64 {
        self.stamp.epoch()
    }
}

impl<'a, C> Deref for ReadGuard<'a, C> {
    type Target = C;
    fn deref(&self) -> &C {
        // SAFETY: the guard holds a read stamp of `owner.lock`.
        unsafe { &*self.owner.value.get() }
    }
}

impl<'a, C> Drop for ReadGuard<'a, C> {
    fn drop(&mut self) {
        // SAFETY: `stamp` is taken exactly once, here.
        let stamp = unsafe { ManuallyDrop::take(&mut self.stamp) };
        self.owner.lock.read_unlock(stamp);
    }
}

/// Exclusive access to a `Stamped` value; releases the write stamp on drop.
pub struct WriteGuard<'a, C> {
    owner: &'a Stamped<C>,
    stamp: ManuallyDrop<WriteStamp>,
}

impl<'a, C> WriteGuard<'a, C> {
    pub fn epoch(&self) -> u64 {
        self.stamp.epoch()
    }
}

impl<'a, C> Deref for WriteGuard<'a, C> {
    type Target = C;
    fn deref(&self) -> &C {
        // SAFETY: the guard holds the write stamp of `owner.lock`.
        unsafe { &*self.owner.value.get() }
    }
}

impl<'a, C> DerefMut for WriteGuard<'a, C> {
    fn deref_mut(&mut self) -> &mut C {
        // SAFETY: the guard holds the write stamp and is mutably borrowed.
        unsafe { &mut *self.owner.value.get() }
    }
}

impl<'a, C> Drop for WriteGuard<'a, C> {
    fn drop(&mut self) {
        // SAFETY: `stamp` is taken exactly once, here.
        let stamp = unsafe { ManuallyDrop::take(&mut self.stamp) };
        self.owner.lock.write_unlock(stamp);
    }
}
