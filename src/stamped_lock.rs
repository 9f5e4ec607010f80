//! StampedLock: a blocking shared/exclusive lock that hands out stamps.
//!
//! States are `UNLOCKED`, `READ_LOCKED(n)` and `WRITE_LOCKED`. Readers share
//! the lock with each other and never with a writer; a writer excludes
//! everyone. Every write acquisition opens a new epoch, so epochs give a
//! total order over writers. There is no upgrade or downgrade path and no
//! timeout; `try_*` variants only probe.
//!
//! Writer preference: once a writer is queued, new readers wait behind it.
//! `read_lock` therefore blocks not only while a writer holds the lock but
//! also while one is waiting for it. A continuous stream of writers can
//! starve readers, never the reverse.
//!
//! Unlocking with a stamp minted by another lock panics before anything is
//! released. The stamp's own lock stays held in that stamp's mode, so after
//! such a panic that lock is unusable: later acquisitions that conflict
//! with the stranded stamp block forever.

use crate::reentrancy::DebugOwners;
use crate::stamp::{Mode, ReadStamp, Stamp, WriteStamp};
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

static NEXT_LOCK_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writer: bool,
    writers_waiting: usize,
    epoch: u64,
}

impl LockState {
    #[inline]
    fn readable(&self) -> bool {
        !self.writer && self.writers_waiting == 0
    }

    #[inline]
    fn writable(&self) -> bool {
        !self.writer && self.readers == 0
    }
}

pub struct StampedLock {
    id: u64,
    state: Mutex<LockState>,
    readers_cv: Condvar,
    writers_cv: Condvar,
    owners: DebugOwners,
}

impl StampedLock {
    pub fn new() -> Self {
        Self {
            id: NEXT_LOCK_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(LockState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
            owners: DebugOwners::new(),
        }
    }

    /// Process-unique identity; every stamp records the id of its lock.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Acquire shared access, blocking while a writer holds or awaits the lock.
    pub fn read_lock(&self) -> ReadStamp {
        let owner = self.owners.enter();
        let mut st = self.state.lock();
        if !st.readable() {
            trace!(
                lock = self.id,
                readers = st.readers,
                writer = st.writer,
                writers_waiting = st.writers_waiting,
                "read_lock blocked"
            );
            while !st.readable() {
                self.readers_cv.wait(&mut st);
            }
        }
        st.readers += 1;
        Stamp::new(self.id, st.epoch, owner)
    }

    /// Shared access if it is available right now. Never blocks, so it is
    /// also allowed on a thread that already holds a stamp of this lock.
    pub fn try_read_lock(&self) -> Option<ReadStamp> {
        let mut st = self.state.lock();
        if !st.readable() {
            return None;
        }
        st.readers += 1;
        let epoch = st.epoch;
        drop(st);
        Some(Stamp::new(self.id, epoch, self.owners.register()))
    }

    /// Release shared access. When the last reader leaves, a queued writer
    /// is woken.
    ///
    /// Panics if the stamp belongs to another lock or if a write epoch began
    /// while it was held.
    pub fn read_unlock(&self, stamp: ReadStamp) {
        self.check_owner(&stamp);
        let (_, epoch, owner) = stamp.consume();
        let mut st = self.state.lock();
        assert!(st.readers > 0, "read_unlock without a read lock held");
        assert_eq!(
            epoch, st.epoch,
            "read stamp from epoch {} released in epoch {}",
            epoch, st.epoch
        );
        st.readers -= 1;
        let wake_writer = st.readers == 0 && st.writers_waiting > 0;
        drop(st);
        self.owners.exit(owner);
        if wake_writer {
            self.writers_cv.notify_one();
        }
    }

    /// Acquire exclusive access, blocking until no reader or writer holds it.
    pub fn write_lock(&self) -> WriteStamp {
        let owner = self.owners.enter();
        let mut st = self.state.lock();
        if !st.writable() {
            trace!(
                lock = self.id,
                readers = st.readers,
                writer = st.writer,
                writers_waiting = st.writers_waiting,
                "write_lock blocked"
            );
            st.writers_waiting += 1;
            while !st.writable() {
                self.writers_cv.wait(&mut st);
            }
            st.writers_waiting -= 1;
        }
        st.writer = true;
        st.epoch += 1;
        Stamp::new(self.id, st.epoch, owner)
    }

    /// Exclusive access if it is available right now.
    pub fn try_write_lock(&self) -> Option<WriteStamp> {
        let mut st = self.state.lock();
        if !st.writable() {
            return None;
        }
        st.writer = true;
        st.epoch += 1;
        let epoch = st.epoch;
        drop(st);
        Some(Stamp::new(self.id, epoch, self.owners.register()))
    }

    /// Release exclusive access and wake waiters: one writer if any are
    /// queued, otherwise every reader.
    ///
    /// Panics if the stamp belongs to another lock or to an earlier epoch.
    pub fn write_unlock(&self, stamp: WriteStamp) {
        self.check_owner(&stamp);
        let (_, epoch, owner) = stamp.consume();
        let mut st = self.state.lock();
        assert!(st.writer, "write_unlock without the write lock held");
        assert_eq!(
            epoch, st.epoch,
            "write stamp from epoch {} released in epoch {}",
            epoch, st.epoch
        );
        st.writer = false;
        let writers_waiting = st.writers_waiting > 0;
        drop(st);
        self.owners.exit(owner);
        if writers_waiting {
            self.writers_cv.notify_one();
        } else {
            self.readers_cv.notify_all();
        }
    }

    fn check_owner<M: Mode>(&self, stamp: &Stamp<M>) {
        if stamp.lock_id() != self.id {
            // The stamp's drop check stays quiet while this panic unwinds.
            let id = stamp.lock_id();
            panic!(
                "{} stamp minted by lock {} passed to lock {}",
                M::NAME,
                id,
                self.id
            );
        }
    }

    pub fn is_write_locked(&self) -> bool {
        self.state.lock().writer
    }

    pub fn read_lock_count(&self) -> usize {
        self.state.lock().readers
    }

    /// Number of write epochs opened so far.
    pub fn write_epoch(&self) -> u64 {
        self.state.lock().epoch
    }
}

impl Default for StampedLock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StampedLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        f.debug_struct("StampedLock")
            .field("id", &self.id)
            .field("readers", &st.readers)
            .field("writer", &st.writer)
            .field("writers_waiting", &st.writers_waiting)
            .field("epoch", &st.epoch)
            .finish()
    }
}
