//! ConcurrentArray: an `Array` behind a `StampedLock`.
//!
//! Mutation happens under the write stamp, consistent multi-field reads under
//! a read stamp. The convenience methods below each take the lock for
//! exactly one operation; compose several operations with `write()`/`read()`
//! or the stamp API.

use crate::array::Array;
use crate::stamped::Stamped;

pub type ConcurrentArray<T> = Stamped<Array<T>>;

impl<T> Stamped<Array<T>> {
    pub fn with_capacity(capacity: usize) -> Self {
        Stamped::new(Array::with_capacity(capacity))
    }

    pub fn add(&self, value: T) {
        self.write().add(value)
    }

    pub fn add_all<I>(&self, source: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.write().add_all(source)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn trim_to_size(&self) {
        self.write().trim_to_size()
    }

    pub fn clear(&self) {
        self.write().clear()
    }
}

impl<T: PartialEq> Stamped<Array<T>> {
    pub fn fast_remove(&self, value: &T) -> bool {
        self.write().fast_remove(value)
    }

    pub fn remove(&self, value: &T) -> bool {
        self.write().remove(value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.read().contains(value)
    }
}

impl<T: Clone> Stamped<Array<T>> {
    /// Copy of the live elements taken under one read stamp.
    pub fn snapshot(&self) -> Vec<T> {
        self.read().to_vec()
    }
}
