//! ConcurrentObjectDictionary: an `ObjectDictionary` behind a `StampedLock`.

use crate::object_dictionary::ObjectDictionary;
use crate::stamped::Stamped;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

pub type ConcurrentObjectDictionary<K, V, S = DefaultHashBuilder> =
    Stamped<ObjectDictionary<K, V, S>>;

impl<K, V, S> Stamped<ObjectDictionary<K, V, S>>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.write().put(key, value)
    }

    pub fn remove<Q>(&self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.write().remove(q)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.read().contains_key(q)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear()
    }
}

impl<K, V, S> Stamped<ObjectDictionary<K, V, S>>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    pub fn get_cloned<Q>(&self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.read().get(q).cloned()
    }

    /// Cached lookup: on a miss, compute outside any lock and insert if the
    /// key is still absent.
    ///
    /// `compute` may run on several threads racing for the same key; exactly
    /// one result is stored and every caller gets the stored value.
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let stamp = self.read_lock();
        let hit = self.view(&stamp).get(&key).cloned();
        self.read_unlock(stamp);
        if let Some(v) = hit {
            return v;
        }

        let value = compute();

        let mut stamp = self.write_lock();
        let stored = self
            .view_mut(&mut stamp)
            .get_or_insert_with(key, || value)
            .clone();
        self.write_unlock(stamp);
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn convenience_ops_round_trip() {
        let d: ConcurrentObjectDictionary<String, u32> = ConcurrentObjectDictionary::default();
        assert!(d.is_empty());
        assert_eq!(d.put("a".to_string(), 1), None);
        assert_eq!(d.put("a".to_string(), 2), Some(1));
        assert_eq!(d.len(), 1);
        assert!(d.contains_key("a"));
        assert_eq!(d.get_cloned("a"), Some(2));
        assert_eq!(d.remove("a"), Some(2));
        assert_eq!(d.get_cloned("a"), None);
        d.put("b".to_string(), 3);
        d.clear();
        assert!(d.is_empty());
    }

    #[test]
    fn get_or_insert_with_hits_without_computing() {
        let d: ConcurrentObjectDictionary<&str, u32> = ConcurrentObjectDictionary::default();
        d.put("k", 7);
        let v = d.get_or_insert_with("k", || panic!("must not compute on a hit"));
        assert_eq!(v, 7);
    }

    /// Invariant: racing computations for one key converge on a single
    /// stored value that every caller observes.
    #[test]
    fn racing_get_or_insert_with_converges() {
        let d: Arc<ConcurrentObjectDictionary<u32, usize>> = Arc::default();
        let computed = Arc::new(AtomicUsize::new(0));
        let results: Vec<usize> = (0..8)
            .map(|i| {
                let d = d.clone();
                let computed = computed.clone();
                thread::spawn(move || {
                    d.get_or_insert_with(42, || {
                        computed.fetch_add(1, Ordering::SeqCst);
                        i
                    })
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let stored = d.get_cloned(&42).unwrap();
        assert!(results.iter().all(|&r| r == stored));
        assert!(computed.load(Ordering::SeqCst) >= 1);
        assert_eq!(d.len(), 1);
    }
}
