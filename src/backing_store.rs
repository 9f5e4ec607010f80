//! BackingStore: an exactly-sized block of slots with a live prefix.
//!
//! The store owns `capacity` slots of which `[0, len)` are initialized.
//! Slots at or beyond `len` are uninitialized and never read. Capacity only
//! changes through `reallocate`, which moves the live prefix into a fresh
//! block of the requested size; growth policy belongs to the caller.
//!
//! All raw-pointer handling in the crate is confined to this module.

use core::mem::MaybeUninit;
use core::ptr;
use core::slice;

pub(crate) struct BackingStore<T> {
    slots: Box<[MaybeUninit<T>]>,
    len: usize,
}

fn uninit_block<T>(capacity: usize) -> Box<[MaybeUninit<T>]> {
    (0..capacity).map(|_| MaybeUninit::uninit()).collect()
}

impl<T> BackingStore<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: uninit_block(capacity),
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: slots [0, len) are initialized.
        unsafe { slice::from_raw_parts(self.slots.as_ptr() as *const T, self.len) }
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: slots [0, len) are initialized and uniquely borrowed.
        unsafe { slice::from_raw_parts_mut(self.slots.as_mut_ptr() as *mut T, self.len) }
    }

    /// Move the live prefix into a new block of exactly `new_capacity` slots.
    pub(crate) fn reallocate(&mut self, new_capacity: usize) {
        assert!(
            new_capacity >= self.len,
            "reallocate below live length ({} < {})",
            new_capacity,
            self.len
        );
        let mut fresh = uninit_block::<T>(new_capacity);
        // SAFETY: both blocks hold at least `len` slots and do not overlap. The
        // old block is dropped as `MaybeUninit`, so moved values are not dropped.
        unsafe {
            ptr::copy_nonoverlapping(self.slots.as_ptr(), fresh.as_mut_ptr(), self.len);
        }
        self.slots = fresh;
    }

    /// Append into spare capacity. Panics if the store is full.
    #[inline]
    pub(crate) fn push(&mut self, value: T) {
        assert!(!self.is_full(), "push into a full backing store");
        self.slots[self.len].write(value);
        self.len += 1;
    }

    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was initialized and is now outside the live prefix.
        Some(unsafe { self.slots[self.len].assume_init_read() })
    }

    /// Remove `index` by moving the last live element into its slot.
    pub(crate) fn swap_remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "swap_remove index {} out of {}", index, self.len);
        let last = self.len - 1;
        self.len = last;
        let base = self.slots.as_mut_ptr();
        // SAFETY: `index` and `last` are initialized; after the read, `last`
        // is outside the live prefix so its bits may be moved into `index`.
        unsafe {
            let removed = (*base.add(index)).assume_init_read();
            if index != last {
                ptr::copy_nonoverlapping(base.add(last), base.add(index), 1);
            }
            removed
        }
    }

    /// Remove `index` by shifting `(index, len)` left by one slot.
    pub(crate) fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "remove index {} out of {}", index, self.len);
        let tail = self.len - index - 1;
        self.len -= 1;
        let base = self.slots.as_mut_ptr();
        // SAFETY: `index` is initialized; `copy` handles the overlapping shift.
        unsafe {
            let removed = (*base.add(index)).assume_init_read();
            ptr::copy(base.add(index + 1), base.add(index), tail);
            removed
        }
    }

    /// Drop every element past `new_len`.
    pub(crate) fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }
        let old_len = self.len;
        // Shrink first so a panicking destructor cannot cause a double drop.
        self.len = new_len;
        // SAFETY: [new_len, old_len) were initialized and are no longer live.
        unsafe {
            let tail = slice::from_raw_parts_mut(
                self.slots.as_mut_ptr().add(new_len) as *mut T,
                old_len - new_len,
            );
            ptr::drop_in_place(tail);
        }
    }

    /// Keep elements matching `keep`, preserving order. Returns the number removed.
    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let old_len = self.len;
        // Elements are compacted in place; a panic in `keep` leaks the
        // unprocessed tail rather than double-dropping it.
        self.len = 0;
        let base = self.slots.as_mut_ptr();
        let mut write = 0;
        for read in 0..old_len {
            // SAFETY: `read` is initialized and has not been moved yet.
            let keep_it = unsafe { keep((*base.add(read)).assume_init_ref()) };
            unsafe {
                if keep_it {
                    if read != write {
                        ptr::copy_nonoverlapping(base.add(read), base.add(write), 1);
                    }
                    write += 1;
                    self.len = write;
                } else {
                    (*base.add(read)).assume_init_drop();
                }
            }
        }
        self.len = write;
        old_len - write
    }
}

impl<T> Drop for BackingStore<T> {
    fn drop(&mut self) {
        self.truncate(0);
    }
}

impl<T: Clone> Clone for BackingStore<T> {
    fn clone(&self) -> Self {
        let mut out = BackingStore::with_capacity(self.capacity());
        for v in self.as_slice() {
            out.push(v.clone());
        }
        out
    }
}
