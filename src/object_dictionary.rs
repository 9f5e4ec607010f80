//! ObjectDictionary: a chained hash table with an explicit bucket array.
//!
//! Layout
//! - Entries live in a generational `SlotMap`; each entry stores its key,
//!   value, the precomputed `u64` hash and the key of the next entry in its
//!   bucket chain.
//! - `buckets` has a power-of-two length `B`; bucket `hash & (B - 1)` holds
//!   the head of a singly linked chain.
//! - When `len > B * load_factor` the bucket array doubles and every live
//!   entry is relinked using its stored hash; `K: Hash` runs exactly once per
//!   insertion and never during a rehash.
//!
//! Entries never move in the slot store, so `Handle`s stay valid across
//! rehashes until their entry is removed.

use crate::config::{DictionaryConfig, DEFAULT_INITIAL_BUCKETS, DEFAULT_LOAD_FACTOR};
use crate::error::Result;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{DefaultKey, SlotMap};
use tracing::debug;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn key<'a, K, V, S>(&self, map: &'a ObjectDictionary<K, V, S>) -> Option<&'a K> {
        map.slots.get(self.0).map(|e| &e.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ObjectDictionary<K, V, S>) -> Option<&'a V> {
        map.slots.get(self.0).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, S>(
        &self,
        map: &'a mut ObjectDictionary<K, V, S>,
    ) -> Option<&'a mut V> {
        map.slots.get_mut(self.0).map(|e| &mut e.value)
    }
}

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<DefaultKey>,
}

pub struct ObjectDictionary<K, V, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Vec<Option<DefaultKey>>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    load_factor: f32,
    threshold: usize,
}

fn threshold_for(buckets: usize, load_factor: f32) -> usize {
    let t = buckets as f64 * load_factor as f64;
    if t >= usize::MAX as f64 {
        usize::MAX
    } else {
        t as usize
    }
}

impl<K, V> ObjectDictionary<K, V> {
    pub fn new() -> Self {
        Self::build(
            DEFAULT_INITIAL_BUCKETS,
            DEFAULT_LOAD_FACTOR,
            DefaultHashBuilder::default(),
        )
    }

    pub fn with_config(config: DictionaryConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for ObjectDictionary<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(&K, &V)` pairs.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over `(&K, &mut V)` pairs.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, S> ObjectDictionary<K, V, S> {
    fn build(buckets: usize, load_factor: f32, hasher: S) -> Self {
        Self {
            hasher,
            buckets: vec![None; buckets],
            slots: SlotMap::with_key(),
            load_factor,
            threshold: threshold_for(buckets, load_factor),
        }
    }

    pub fn with_hasher(hasher: S) -> Self {
        Self::build(DEFAULT_INITIAL_BUCKETS, DEFAULT_LOAD_FACTOR, hasher)
    }

    pub fn with_config_and_hasher(config: DictionaryConfig, hasher: S) -> Result<Self> {
        config.validate()?;
        let buckets = config.bucket_count()?;
        Ok(Self::build(buckets, config.load_factor, hasher))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current size `B` of the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Drop every entry. The bucket array keeps its size.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.buckets.iter_mut().for_each(|b| *b = None);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.values().map(|e| &e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.values().map(|e| &e.value)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.slots.values_mut().map(|e| &mut e.value)
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    /// Relink every entry into a fresh bucket array of `new_count` buckets.
    fn rehash(&mut self, new_count: usize) {
        debug_assert!(new_count.is_power_of_two());
        debug!(
            from = self.buckets.len(),
            to = new_count,
            entries = self.slots.len(),
            "dictionary rehash"
        );
        let mask = new_count - 1;
        let mut buckets: Vec<Option<DefaultKey>> = vec![None; new_count];
        for (k, e) in self.slots.iter_mut() {
            let b = (e.hash as usize) & mask;
            e.next = buckets[b];
            buckets[b] = Some(k);
        }
        self.buckets = buckets;
        self.threshold = threshold_for(new_count, self.load_factor);
    }

    /// Double the bucket array until `len` fits under the threshold.
    fn grow_to_fit(&mut self, len: usize) {
        let mut target = self.buckets.len();
        while len > threshold_for(target, self.load_factor) {
            match target.checked_mul(2) {
                Some(t) => target = t,
                None => break,
            }
        }
        if target != self.buckets.len() {
            self.rehash(target);
        }
    }

    /// Make room for `additional` more entries without intermediate rehashes.
    pub fn reserve(&mut self, additional: usize) {
        self.grow_to_fit(self.len().saturating_add(additional));
    }

    fn unlink(&mut self, k: DefaultKey) -> Option<(K, V)> {
        let entry = self.slots.get(k)?;
        let b = self.bucket_of(entry.hash);
        let next = entry.next;
        let mut cursor = self.buckets[b];
        let mut prev: Option<DefaultKey> = None;
        while let Some(c) = cursor {
            if c == k {
                match prev {
                    None => self.buckets[b] = next,
                    Some(p) => {
                        if let Some(pe) = self.slots.get_mut(p) {
                            pe.next = next;
                        }
                    }
                }
                break;
            }
            prev = Some(c);
            cursor = self.slots.get(c).and_then(|e| e.next);
        }
        self.slots.remove(k).map(|e| (e.key, e.value))
    }

    /// Remove the entry behind `handle`. Returns `None` for stale handles.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        self.unlink(handle.0)
    }

    /// Length of the longest bucket chain; a diagnostic for hash quality.
    pub fn longest_chain(&self) -> usize {
        self.buckets
            .iter()
            .map(|head| {
                let mut n = 0;
                let mut cursor = *head;
                while let Some(c) = cursor {
                    n += 1;
                    cursor = self.slots.get(c).and_then(|e| e.next);
                }
                n
            })
            .max()
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.buckets.len().is_power_of_two());
        let mut seen = 0;
        for (b, head) in self.buckets.iter().enumerate() {
            let mut cursor = *head;
            while let Some(c) = cursor {
                let e = self.slots.get(c).expect("chain links a live slot");
                assert_eq!(self.bucket_of(e.hash), b, "entry chained in wrong bucket");
                seen += 1;
                cursor = e.next;
            }
        }
        assert_eq!(seen, self.slots.len(), "every live entry is chained exactly once");
        assert!(self.len() <= self.threshold || self.buckets.len().checked_mul(2).is_none());
    }
}

impl<K, V, S> ObjectDictionary<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find_slot<Q>(&self, hash: u64, q: &Q) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cursor = self.buckets[self.bucket_of(hash)];
        while let Some(c) = cursor {
            let e = &self.slots[c];
            if e.hash == hash && e.key.borrow() == q {
                return Some(c);
            }
            cursor = e.next;
        }
        None
    }

    fn link_new(&mut self, hash: u64, key: K, value: V) -> DefaultKey {
        let b = self.bucket_of(hash);
        let head = self.buckets[b];
        let k = self.slots.insert(Entry {
            key,
            value,
            hash,
            next: head,
        });
        self.buckets[b] = Some(k);
        k
    }

    /// Insert or replace. Returns the previous value when the key was present.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        if let Some(k) = self.find_slot(hash, &key) {
            return Some(core::mem::replace(&mut self.slots[k].value, value));
        }
        self.link_new(hash, key, value);
        if self.len() > self.threshold {
            self.grow_to_fit(self.len());
        }
        None
    }

    /// Merge a clone of every entry of `other`, replacing values of shared keys.
    pub fn put_all<S2>(&mut self, other: &ObjectDictionary<K, V, S2>)
    where
        K: Clone,
        V: Clone,
    {
        self.reserve(other.len());
        for (k, v) in other.iter() {
            self.put(k.clone(), v.clone());
        }
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.find_slot(hash, q).map(|k| &self.slots[k].value)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let k = self.find_slot(hash, q)?;
        Some(&mut self.slots[k].value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.find_slot(hash, q).map(|k| {
            let e = &self.slots[k];
            (&e.key, &e.value)
        })
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.find_slot(hash, q).is_some()
    }

    /// Stable handle to the entry for `q`.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.find_slot(hash, q).map(Handle)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let k = self.find_slot(hash, q)?;
        self.unlink(k)
    }

    /// Value for `key`, inserting `default()` first on a miss. `default`
    /// only runs when the key is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let k = match self.find_slot(hash, &key) {
            Some(k) => k,
            None => {
                let value = default();
                let k = self.link_new(hash, key, value);
                if self.len() > self.threshold {
                    self.grow_to_fit(self.len());
                }
                k
            }
        };
        &mut self.slots[k].value
    }
}

impl<K, V, S> Clone for ObjectDictionary<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            buckets: self.buckets.clone(),
            slots: self.slots.clone(),
            load_factor: self.load_factor,
            threshold: self.threshold,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ObjectDictionary<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for ObjectDictionary<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Extend<(K, V)> for ObjectDictionary<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ObjectDictionary<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut d = Self::with_hasher(S::default());
        d.extend(iter);
        d
    }
}

impl<'a, K, V, S> IntoIterator for &'a ObjectDictionary<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectionError;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // force all keys into the same bucket
    }

    /// Invariant: a second `put` for a key replaces the value without
    /// changing the entry count.
    #[test]
    fn put_replaces_without_growing_count() {
        let mut d: ObjectDictionary<String, i32> = ObjectDictionary::new();
        assert_eq!(d.put("k".to_string(), 1), None);
        assert_eq!(d.len(), 1);
        assert_eq!(d.put("k".to_string(), 2), Some(1));
        assert_eq!(d.len(), 1);
        assert_eq!(d.get("k"), Some(&2));
        d.check_invariants();
    }

    #[test]
    fn absent_lookups_return_none() {
        let mut d: ObjectDictionary<String, i32> = ObjectDictionary::new();
        assert_eq!(d.get("missing"), None);
        assert!(!d.contains_key("missing"));
        assert!(d.find("missing").is_none());
        assert_eq!(d.remove("missing"), None);
    }

    /// Invariant: exceeding `B * load_factor` doubles B and keeps every entry.
    #[test]
    fn rehash_on_threshold_keeps_all_entries() {
        let mut d: ObjectDictionary<u32, u32> = ObjectDictionary::new();
        assert_eq!(d.bucket_count(), 16);
        for i in 0..12 {
            d.put(i, i * 10);
        }
        assert_eq!(d.bucket_count(), 16, "12 entries fit under 16 * 0.75");
        d.put(12, 120);
        assert_eq!(d.bucket_count(), 32);
        for i in 13..1000 {
            d.put(i, i * 10);
        }
        assert!(d.bucket_count() as f32 * d.load_factor() >= d.len() as f32);
        for i in 0..1000 {
            assert_eq!(d.get(&i), Some(&(i * 10)));
        }
        d.check_invariants();
    }

    /// Invariant: handles survive rehashing because entries never move.
    #[test]
    fn handles_stable_across_rehash() {
        let mut d: ObjectDictionary<u32, &str> = ObjectDictionary::new();
        d.put(1, "one");
        let h = d.find(&1).unwrap();
        for i in 2..200 {
            d.put(i, "x");
        }
        assert_eq!(h.key(&d), Some(&1));
        assert_eq!(h.value(&d), Some(&"one"));
        *h.value_mut(&mut d).unwrap() = "uno";
        assert_eq!(d.get(&1), Some(&"uno"));
        assert_eq!(d.remove_handle(h), Some((1, "uno")));
        assert!(h.value(&d).is_none(), "stale handle must not resolve");
        d.check_invariants();
    }

    /// Invariant: equality resolves the right entry when every key collides,
    /// including removal from the head, middle and tail of a chain.
    #[test]
    fn collisions_resolved_by_equality() {
        let mut d: ObjectDictionary<String, i32, ConstBuildHasher> =
            ObjectDictionary::with_hasher(ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            d.put(k.to_string(), i as i32);
        }
        assert_eq!(d.longest_chain(), 5);
        assert_eq!(d.get("c"), Some(&2));
        // Chain order is most-recent-first: e, d, c, b, a.
        assert_eq!(d.remove("e"), Some(4));
        assert_eq!(d.remove("c"), Some(2));
        assert_eq!(d.remove("a"), Some(0));
        d.check_invariants();
        let left: BTreeSet<&str> = d.keys().map(|s| s.as_str()).collect();
        assert_eq!(left, BTreeSet::from(["b", "d"]));
        assert_eq!(d.get("b"), Some(&1));
        assert_eq!(d.get("d"), Some(&3));
    }

    #[test]
    fn get_or_insert_with_is_lazy() {
        let mut d: ObjectDictionary<&str, String> = ObjectDictionary::new();
        let calls = Cell::new(0);
        d.get_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            "v".to_string()
        });
        let v = d.get_or_insert_with("k", || {
            calls.set(calls.get() + 1);
            "v2".to_string()
        });
        v.push('!');
        assert_eq!(calls.get(), 1, "default() must not run on a hit");
        assert_eq!(d.get("k").map(String::as_str), Some("v!"));
    }

    #[test]
    fn put_all_merges_and_overrides() {
        let mut a: ObjectDictionary<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
        let b: ObjectDictionary<&str, i32> = [("y", 20), ("z", 30)].into_iter().collect();
        a.put_all(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get("x"), Some(&1));
        assert_eq!(a.get("y"), Some(&20));
        assert_eq!(a.get("z"), Some(&30));
        assert_eq!(b.len(), 2, "source is untouched");
    }

    #[test]
    fn clear_keeps_bucket_count() {
        let mut d: ObjectDictionary<u32, u32> = (0..100).map(|i| (i, i)).collect();
        let b = d.bucket_count();
        d.clear();
        assert!(d.is_empty());
        assert_eq!(d.bucket_count(), b);
        assert!(!d.contains_key(&5));
        d.put(5, 5);
        assert_eq!(d.get(&5), Some(&5));
        d.check_invariants();
    }

    #[test]
    fn config_controls_initial_buckets_and_growth() {
        let cfg = DictionaryConfig::new().initial_buckets(3).load_factor(2.0);
        let mut d: ObjectDictionary<u32, ()> = ObjectDictionary::with_config(cfg).unwrap();
        assert_eq!(d.bucket_count(), 4);
        for i in 0..8 {
            d.put(i, ());
        }
        assert_eq!(d.bucket_count(), 4, "8 entries fit under 4 * 2.0");
        d.put(8, ());
        assert_eq!(d.bucket_count(), 8);
        d.check_invariants();
    }

    #[test]
    fn tiny_load_factor_grows_enough() {
        let cfg = DictionaryConfig::new().initial_buckets(1).load_factor(0.01);
        let mut d: ObjectDictionary<u32, ()> = ObjectDictionary::with_config(cfg).unwrap();
        d.put(1, ());
        assert!(d.bucket_count() >= 100);
        d.check_invariants();
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = DictionaryConfig::new().load_factor(0.0);
        match ObjectDictionary::<u32, u32>::with_config(cfg) {
            Err(CollectionError::InvalidLoadFactor(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn reserve_prevents_rehash_during_extend() {
        let mut d: ObjectDictionary<u32, u32> = ObjectDictionary::new();
        d.reserve(500);
        let b = d.bucket_count();
        d.extend((0..500).map(|i| (i, i)));
        assert_eq!(d.bucket_count(), b);
        assert_eq!(d.len(), 500);
    }

    #[test]
    fn iteration_and_mutation() {
        let mut d: ObjectDictionary<String, i32> = ObjectDictionary::new();
        for (i, k) in ["k1", "k2", "k3"].iter().enumerate() {
            d.put(k.to_string(), i as i32);
        }
        for (_k, v) in d.iter_mut() {
            *v += 10;
        }
        let mut seen: Vec<(String, i32)> = d.iter().map(|(k, v)| (k.clone(), *v)).collect();
        seen.sort();
        assert_eq!(
            seen,
            vec![
                ("k1".to_string(), 10),
                ("k2".to_string(), 11),
                ("k3".to_string(), 12)
            ]
        );
        let total: i32 = d.values().sum();
        assert_eq!(total, 33);
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a: ObjectDictionary<u8, u8> = [(1, 1), (2, 2)].into_iter().collect();
        let b: ObjectDictionary<u8, u8> = [(2, 2), (1, 1)].into_iter().collect();
        assert_eq!(a, b);
        let c: ObjectDictionary<u8, u8> = [(1, 1), (2, 3)].into_iter().collect();
        assert_ne!(a, c);
    }
}
