//! stamped-collections: growable arrays and hashed dictionaries, each with a
//! concurrency-safe variant coordinated by a stamped reader/writer lock.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small collection core whose invariants can be checked layer by
//!   layer: storage, sequence, table, lock, and the lock-wrapped variants.
//! - Layers:
//!   - BackingStore<T>: exactly-sized block of slots with a live prefix
//!     `[0, len)`. Owns all raw-pointer handling.
//!   - Array<T>: growable sequence over one BackingStore; growth to
//!     `C + max(C >> 1, 1)`, O(1) `swap_remove`/`fast_remove` and O(n)
//!     order-preserving `ordered_remove`/`remove`, `trim_to_size`.
//!     `IntegerArray`/`LongArray` are its `i32`/`i64` instantiations.
//!   - ObjectDictionary<K, V, S>: power-of-two bucket array of chains
//!     threaded through a generational slot store; doubles and relinks
//!     when `len > buckets * load_factor`.
//!   - StampedLock: blocking shared/exclusive lock handing out linear
//!     `ReadStamp`/`WriteStamp` tokens, one write epoch per writer.
//!   - Stamped<C>: value plus lock, reached via RAII guards or via stamps.
//!     `ConcurrentArray<T>` and `ConcurrentObjectDictionary<K, V, S>` are
//!     `Stamped` instantiations with one-shot convenience methods.
//!
//! Constraints
//! - In-process, shared memory only. No persistence, no serialization.
//! - One coarse lock per concurrent collection; no per-element locking.
//! - Readers run in parallel with each other, never with a writer. Writers
//!   are totally ordered by their epochs.
//! - No timeouts or cancellation: a blocked `read_lock`/`write_lock` waits
//!   until it is granted. `try_*` variants only probe.
//!
//! Lock misuse
//! - Stamps are linear. Dropping one without unlocking panics, as does
//!   unlocking with a stamp minted by another lock or in an older epoch.
//! - Read and write stamps are distinct types; passing a read stamp to
//!   `write_unlock` does not compile.
//! - The lock is not reentrant and has no upgrade path. Debug builds track
//!   which threads hold stamps and panic on same-thread reacquisition
//!   instead of deadlocking; release builds carry no tracking.
//!
//! Failure semantics
//! - Index-based access outside `[0, len)` panics; `try_*` variants return
//!   `CollectionError::IndexOutOfBounds`.
//! - Absent keys and unmatched searches return `None`.
//! - Allocation failure aborts, as with std collections.
//!
//! Hashing
//! - Each dictionary entry stores its `u64` hash. `K: Hash` runs once per
//!   insertion and never during a rehash; equality runs only within one
//!   bucket chain.
//!
//! Logging
//! - `tracing` events: backing store reallocation (trace), dictionary
//!   rehash (debug), blocked lock acquisition (trace). The library never
//!   installs a subscriber.

mod backing_store;
pub mod array;
pub mod concurrent_array;
pub mod concurrent_dictionary;
pub mod config;
pub mod error;
pub mod factory;
pub mod object_dictionary;
mod reentrancy;
pub mod stamp;
pub mod stamped;
pub mod stamped_lock;

mod array_proptest;
mod object_dictionary_proptest;

// Public surface
pub use array::{Array, IntegerArray, LongArray};
pub use concurrent_array::ConcurrentArray;
pub use concurrent_dictionary::ConcurrentObjectDictionary;
pub use config::DictionaryConfig;
pub use error::{CollectionError, Result};
pub use object_dictionary::{Handle, ObjectDictionary};
pub use stamp::{ReadStamp, Stamp, WriteStamp};
pub use stamped::{ReadGuard, Stamped, WriteGuard};
pub use stamped_lock::StampedLock;
