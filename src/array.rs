//! Array: a growable contiguous sequence over a `BackingStore`.
//!
//! Growth is by reallocate-and-copy when the store is full, to
//! `C + max(C >> 1, 1)` slots. Two removal primitives are offered:
//! `swap_remove`/`fast_remove` run in O(1) and do not preserve order;
//! `ordered_remove`/`remove` shift the tail and do.
//!
//! Any mutation may reallocate; slices obtained from `as_slice` before a
//! mutation are invalidated by the borrow checker rather than by convention.

use crate::backing_store::BackingStore;
use crate::error::{CollectionError, Result};
use core::cmp::Ordering;
use core::fmt;
use core::ops::{Index, IndexMut};
use tracing::trace;

/// Array of unboxed `i32` values.
pub type IntegerArray = Array<i32>;
/// Array of unboxed `i64` values.
pub type LongArray = Array<i64>;

pub struct Array<T> {
    store: BackingStore<T>,
}

#[inline]
fn grown_capacity(capacity: usize) -> usize {
    capacity.saturating_add((capacity >> 1).max(1))
}

impl<T> Array<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: BackingStore::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Make room for `additional` more elements, growing by the regular
    /// policy or straight to the required size, whichever is larger.
    pub fn reserve(&mut self, additional: usize) {
        let required = self
            .len()
            .checked_add(additional)
            .expect("capacity overflow");
        if required <= self.capacity() {
            return;
        }
        let target = grown_capacity(self.capacity()).max(required);
        self.reallocate(target);
    }

    fn reallocate(&mut self, new_capacity: usize) {
        trace!(
            from = self.capacity(),
            to = new_capacity,
            len = self.len(),
            "array backing store reallocated"
        );
        self.store.reallocate(new_capacity);
    }

    /// Append at index `len`, growing first if the store is full.
    pub fn add(&mut self, value: T) {
        if self.store.is_full() {
            self.reallocate(grown_capacity(self.capacity()));
        }
        self.store.push(value);
    }

    /// Append every element of `source` in iteration order.
    pub fn add_all<I>(&mut self, source: I)
    where
        I: IntoIterator<Item = T>,
    {
        let iter = source.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(lower);
        for v in iter {
            self.add(v);
        }
    }

    /// Element at `index`.
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get(&self, index: usize) -> &T {
        match self.try_get(index) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    #[inline]
    pub fn try_get(&self, index: usize) -> Result<&T> {
        self.store
            .as_slice()
            .get(index)
            .ok_or_else(|| CollectionError::out_of_bounds(index, self.len()))
    }

    /// Mutable element at `index`. Panics if `index >= len()`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.store.as_mut_slice().get_mut(index) {
            Some(v) => v,
            None => panic!("{}", CollectionError::out_of_bounds(index, len)),
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn pop(&mut self) -> Option<T> {
        self.store.pop()
    }

    /// O(1) removal of `index`: the last element takes its place.
    ///
    /// Panics if `index >= len()`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        self.check_index(index);
        self.store.swap_remove(index)
    }

    pub fn try_swap_remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len() {
            return Err(CollectionError::out_of_bounds(index, self.len()));
        }
        Ok(self.store.swap_remove(index))
    }

    /// O(n) removal of `index` preserving the order of the rest.
    ///
    /// Panics if `index >= len()`.
    pub fn ordered_remove(&mut self, index: usize) -> T {
        self.check_index(index);
        self.store.remove(index)
    }

    pub fn try_ordered_remove(&mut self, index: usize) -> Result<T> {
        if index >= self.len() {
            return Err(CollectionError::out_of_bounds(index, self.len()));
        }
        Ok(self.store.remove(index))
    }

    #[inline]
    fn check_index(&self, index: usize) {
        if index >= self.len() {
            panic!("{}", CollectionError::out_of_bounds(index, self.len()));
        }
    }

    /// Remove every element matching `pred`, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn remove_if<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.store.retain(|v| !pred(v))
    }

    pub fn clear(&mut self) {
        self.store.truncate(0);
    }

    pub fn truncate(&mut self, len: usize) {
        self.store.truncate(len);
    }

    /// Shrink the backing store to exactly `len()` slots.
    pub fn trim_to_size(&mut self) {
        if self.capacity() != self.len() {
            self.reallocate(self.len());
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.store.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.store.as_mut_slice()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(f)
    }

    /// First element matching `pred`.
    pub fn search<F>(&self, mut pred: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().find(|v| pred(v))
    }

    pub fn find_index<F>(&self, pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().position(pred)
    }

    /// First element that `cmp` considers equal to `probe`.
    pub fn find_by<Q, F>(&self, probe: &Q, mut cmp: F) -> Option<&T>
    where
        Q: ?Sized,
        F: FnMut(&T, &Q) -> Ordering,
    {
        self.iter().find(|v| cmp(v, probe) == Ordering::Equal)
    }

    pub fn sort_by<F>(&mut self, cmp: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.as_mut_slice().sort_by(cmp)
    }

    /// Binary search over `[0, len)`; only meaningful after sorting with a
    /// compatible ordering.
    pub fn binary_search_by<F>(&self, f: F) -> core::result::Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        self.as_slice().binary_search_by(f)
    }
}

impl<T: PartialEq> Array<T> {
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|v| v == value)
    }

    pub fn last_index_of(&self, value: &T) -> Option<usize> {
        self.iter().rposition(|v| v == value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Swap-remove the first element equal to `value`. Returns false when absent.
    pub fn fast_remove(&mut self, value: &T) -> bool {
        match self.index_of(value) {
            Some(i) => {
                drop(self.store.swap_remove(i));
                true
            }
            None => false,
        }
    }

    /// Order-preserving removal of the first element equal to `value`.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.index_of(value) {
            Some(i) => {
                drop(self.store.remove(i));
                true
            }
            None => false,
        }
    }
}

impl<T: Ord> Array<T> {
    pub fn sort(&mut self) {
        self.as_mut_slice().sort()
    }
}

impl<T: Clone> Array<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Array<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Array<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(v, f)?;
        }
        f.write_str("]")
    }
}

impl<T: PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for Array<T> {}

impl<T> Index<usize> for Array<T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        self.get(index)
    }
}

impl<T> IndexMut<usize> for Array<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        self.get_mut(index)
    }
}

impl<T> Extend<T> for Array<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_all(iter)
    }
}

impl<T> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut a = Array::new();
        a.add_all(iter);
        a
    }
}

impl<T> From<Vec<T>> for Array<T> {
    fn from(v: Vec<T>) -> Self {
        let mut a = Array::with_capacity(v.len());
        a.add_all(v);
        a
    }
}

impl<T: Clone> From<&[T]> for Array<T> {
    fn from(s: &[T]) -> Self {
        let mut a = Array::with_capacity(s.len());
        a.add_all(s.iter().cloned());
        a
    }
}

impl<'a, T> IntoIterator for &'a Array<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Array<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Invariant: growth from zero follows `C + max(C >> 1, 1)`.
    #[test]
    fn growth_policy_sequence() {
        let mut a: Array<u32> = Array::new();
        let mut seen = vec![a.capacity()];
        for i in 0..20 {
            a.add(i);
            if *seen.last().unwrap() != a.capacity() {
                seen.push(a.capacity());
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 6, 9, 13, 19, 28]);
    }

    /// Invariant: add-only workloads preserve insertion order across many growths.
    #[test]
    fn add_only_preserves_order() {
        let mut a = Array::new();
        for i in 0..1000 {
            a.add(i);
        }
        assert_eq!(a.len(), 1000);
        for i in 0..1000 {
            assert_eq!(*a.get(i), i);
        }
    }

    /// Invariant: `fast_remove` keeps membership exact but not order.
    #[test]
    fn fast_remove_middle_of_three() {
        let mut a: Array<i32> = [1, 2, 3].into_iter().collect();
        assert!(a.fast_remove(&2));
        assert_eq!(a.len(), 2);
        let members: BTreeSet<i32> = a.iter().copied().collect();
        assert_eq!(members, BTreeSet::from([1, 3]));
        assert!(!a.fast_remove(&2), "absent element is a no-op");
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn ordered_remove_preserves_order() {
        let mut a: Array<i32> = (1..=5).collect();
        assert!(a.remove(&2));
        assert_eq!(a.as_slice(), &[1, 3, 4, 5]);
        assert_eq!(a.ordered_remove(0), 1);
        assert_eq!(a.as_slice(), &[3, 4, 5]);
        assert!(!a.remove(&42));
    }

    #[test]
    fn swap_remove_last_index() {
        let mut a: Array<i32> = (1..=3).collect();
        assert_eq!(a.swap_remove(2), 3);
        assert_eq!(a.as_slice(), &[1, 2]);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn get_out_of_range_panics() {
        let a: Array<i32> = (1..=3).collect();
        let _ = a.get(3);
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn swap_remove_out_of_range_panics() {
        let mut a: Array<i32> = Array::new();
        a.swap_remove(0);
    }

    #[test]
    fn try_get_reports_index_and_len() {
        let a: Array<i32> = (1..=3).collect();
        assert_eq!(a.try_get(1), Ok(&2));
        assert_eq!(
            a.try_get(5),
            Err(CollectionError::IndexOutOfBounds { index: 5, len: 3 })
        );
    }

    /// Invariant: `trim_to_size` sets capacity to len, is idempotent, and
    /// leaves the element sequence unchanged.
    #[test]
    fn trim_to_size_idempotent() {
        let mut a: Array<i32> = Array::with_capacity(32);
        a.add_all([5, 6, 7]);
        a.trim_to_size();
        assert_eq!(a.capacity(), 3);
        assert_eq!(a.as_slice(), &[5, 6, 7]);
        a.trim_to_size();
        assert_eq!(a.capacity(), 3);
        assert_eq!(a.as_slice(), &[5, 6, 7]);
        // Growth resumes from the trimmed capacity.
        a.add(8);
        assert_eq!(a.capacity(), 4);
    }

    #[test]
    fn add_all_reserves_at_least_required() {
        let mut a: Array<u8> = Array::with_capacity(2);
        a.add_all(vec![0u8; 10]);
        assert_eq!(a.len(), 10);
        assert_eq!(a.capacity(), 10);
    }

    #[test]
    fn search_find_and_comparator_lookup() {
        let a: Array<(u32, &str)> = vec![(1, "one"), (2, "two"), (3, "three")].into();
        assert_eq!(a.search(|(_, s)| s.len() == 5), Some(&(3, "three")));
        assert_eq!(a.find_index(|(n, _)| *n == 2), Some(1));
        assert_eq!(a.find_by(&2, |(n, _), p| n.cmp(p)), Some(&(2, "two")));
        assert!(a.find_by(&9, |(n, _), p| n.cmp(p)).is_none());
        assert!(a.search(|(n, _)| *n > 10).is_none());
    }

    #[test]
    fn index_of_last_index_of_contains() {
        let a: Array<char> = "abcab".chars().collect();
        assert_eq!(a.index_of(&'b'), Some(1));
        assert_eq!(a.last_index_of(&'b'), Some(4));
        assert!(a.contains(&'c'));
        assert!(!a.contains(&'z'));
    }

    #[test]
    fn sort_and_binary_search() {
        let mut a: LongArray = vec![5i64, -1, 9, 3].into();
        a.sort();
        assert_eq!(a.as_slice(), &[-1, 3, 5, 9]);
        assert_eq!(a.binary_search_by(|v| v.cmp(&5)), Ok(2));
        a.sort_by(|x, y| y.cmp(x));
        assert_eq!(a.as_slice(), &[9, 5, 3, -1]);
    }

    #[test]
    fn remove_if_preserves_order() {
        let mut a: IntegerArray = (0..10).collect();
        assert_eq!(a.remove_if(|v| v % 3 == 0), 4);
        assert_eq!(a.as_slice(), &[1, 2, 4, 5, 7, 8]);
    }

    #[test]
    fn display_formats_primitives() {
        let a: IntegerArray = vec![1, -2, 3].into();
        assert_eq!(a.to_string(), "[1, -2, 3]");
        assert_eq!(IntegerArray::new().to_string(), "[]");
    }

    #[test]
    fn for_each_visits_live_prefix_only() {
        let mut a: Array<i32> = (0..8).collect();
        a.truncate(3);
        let mut sum = 0;
        a.for_each(|v| sum += *v);
        assert_eq!(sum, 3);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut a: Array<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let cap = a.capacity();
        a.clear();
        assert!(a.is_empty());
        assert_eq!(a.capacity(), cap);
    }

    #[test]
    fn index_mut_and_clone_are_independent() {
        let mut a: Array<i32> = vec![1, 2].into();
        let b = a.clone();
        a[0] = 10;
        assert_eq!(a.as_slice(), &[10, 2]);
        assert_eq!(b.as_slice(), &[1, 2]);
        assert_ne!(a, b);
    }
}
