#![cfg(test)]

// Property tests for ObjectDictionary kept inside the crate so chain and
// bucket invariants can be checked after every operation.

use crate::config::DictionaryConfig;
use crate::object_dictionary::{Handle, ObjectDictionary};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Keeps only the low `bits` of a real hash so chains get long and distinct
// keys share full hashes.
#[derive(Clone, Default)]
struct NarrowBuildHasher {
    bits: u32,
    inner: hashbrown::hash_map::DefaultHashBuilder,
}

struct NarrowHasher<H> {
    mask: u64,
    inner: H,
}

impl BuildHasher for NarrowBuildHasher {
    type Hasher = NarrowHasher<<hashbrown::hash_map::DefaultHashBuilder as BuildHasher>::Hasher>;
    fn build_hasher(&self) -> Self::Hasher {
        NarrowHasher {
            mask: (1u64 << self.bits) - 1,
            inner: self.inner.build_hasher(),
        }
    }
}

impl<H: Hasher> Hasher for NarrowHasher<H> {
    fn finish(&self) -> u64 {
        self.inner.finish() & self.mask
    }
    fn write(&mut self, bytes: &[u8]) {
        self.inner.write(bytes)
    }
}

#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    GetOrInsert(usize, i32),
    Remove(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Reserve(usize),
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

// Pool-indexed operations shrink toward earlier keys and shorter pools.
fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=40).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Find),
            1 => "[a-z]{0,4}".prop_map(OpI::Contains),
            1 => (idx, any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..64).prop_map(OpI::Reserve),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = DictionaryConfig> {
    (1usize..=32, prop_oneof![Just(0.25f32), Just(0.75), Just(1.0), Just(3.0)])
        .prop_map(|(b, lf)| DictionaryConfig::new().initial_buckets(b).load_factor(lf))
}

// Property: state-machine equivalence against std::collections::HashMap.
// - `put` replaces and returns the prior value exactly when the model has one.
// - `get_or_insert_with` computes only on a miss.
// - Handles stay valid across rehashes until their entry is removed.
// - After every operation: each live entry is chained once, in the bucket its
//   stored hash selects; the bucket count is a power of two; and
//   `len <= floor(buckets * load_factor)`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 96, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(
        (pool, ops) in arb_scenario(),
        config in arb_config(),
        bits in 1u32..=16,
    ) {
        let hasher = NarrowBuildHasher { bits, ..NarrowBuildHasher::default() };
        let mut sut: ObjectDictionary<Key, i32, NarrowBuildHasher> =
            ObjectDictionary::with_config_and_hasher(config, hasher).unwrap();
        let mut model: HashMap<Key, i32> = HashMap::new();
        let mut live: HashMap<Key, Handle> = HashMap::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = key_from(&pool, i);
                    let prev = sut.put(k.clone(), v);
                    prop_assert_eq!(prev, model.insert(k.clone(), v));
                    let h = sut.find(&k).unwrap();
                    if let Some(&old) = live.get(&k) {
                        prop_assert_eq!(h, old, "replacement keeps the entry in place");
                    }
                    live.insert(k, h);
                }
                OpI::GetOrInsert(i, v) => {
                    let k = key_from(&pool, i);
                    let present = model.contains_key(&k);
                    let mut ran = false;
                    let got = *sut.get_or_insert_with(k.clone(), || { ran = true; v });
                    prop_assert_eq!(ran, !present);
                    let expected = *model.entry(k.clone()).or_insert(v);
                    prop_assert_eq!(got, expected);
                    let h = sut.find(&k).unwrap();
                    live.insert(k, h);
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
                    if let Some(h) = live.remove(&k) {
                        stale.push(h);
                    }
                }
                OpI::Find(i) => {
                    let k = key_from(&pool, i);
                    match sut.find(&k) {
                        Some(h) => {
                            prop_assert_eq!(Some(&h), live.get(&k));
                            prop_assert_eq!(h.value(&sut), model.get(&k));
                            prop_assert_eq!(h.key(&sut), Some(&k));
                        }
                        None => prop_assert!(!model.contains_key(&k)),
                    }
                }
                OpI::Contains(s) => {
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    if let Some(v) = sut.get_mut(&k) {
                        *v = v.wrapping_add(d);
                    }
                    if let Some(v) = model.get_mut(&k) {
                        *v = v.wrapping_add(d);
                    }
                }
                OpI::Reserve(n) => {
                    let before = sut.bucket_count();
                    sut.reserve(n);
                    prop_assert!(sut.bucket_count() >= before);
                }
                OpI::Clear => {
                    let before = sut.bucket_count();
                    sut.clear();
                    model.clear();
                    stale.extend(live.drain().map(|(_, h)| h));
                    prop_assert_eq!(sut.bucket_count(), before);
                }
            }

            sut.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            for (k, h) in &live {
                prop_assert_eq!(h.value(&sut), model.get(k));
            }
            for h in &stale {
                prop_assert!(h.value(&sut).is_none(), "stale handle must not resolve");
            }
        }

        let mut seen: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let mut want: Vec<(Key, i32)> = model.into_iter().collect();
        seen.sort_by(|a, b| a.0 .0.cmp(&b.0 .0));
        want.sort_by(|a, b| a.0 .0.cmp(&b.0 .0));
        prop_assert_eq!(seen, want);
    }
}
