//! Construction entry points choosing between plain and concurrent variants.
//!
//! The element type is a type parameter; there is no runtime type token.

use crate::array::{Array, IntegerArray, LongArray};
use crate::concurrent_array::ConcurrentArray;
use crate::concurrent_dictionary::ConcurrentObjectDictionary;
use crate::config::DictionaryConfig;
use crate::error::Result;
use crate::object_dictionary::ObjectDictionary;
use crate::stamped::Stamped;

pub fn new_array<T>() -> Array<T> {
    Array::new()
}

pub fn new_array_with_capacity<T>(capacity: usize) -> Array<T> {
    Array::with_capacity(capacity)
}

pub fn new_integer_array() -> IntegerArray {
    IntegerArray::new()
}

pub fn new_long_array() -> LongArray {
    LongArray::new()
}

pub fn new_concurrent_array<T>() -> ConcurrentArray<T> {
    Stamped::new(Array::new())
}

pub fn new_object_dictionary<K, V>() -> ObjectDictionary<K, V> {
    ObjectDictionary::new()
}

pub fn new_object_dictionary_with<K, V>(config: DictionaryConfig) -> Result<ObjectDictionary<K, V>> {
    ObjectDictionary::with_config(config)
}

pub fn new_concurrent_object_dictionary<K, V>() -> ConcurrentObjectDictionary<K, V> {
    Stamped::new(ObjectDictionary::new())
}

pub fn new_concurrent_object_dictionary_with<K, V>(
    config: DictionaryConfig,
) -> Result<ConcurrentObjectDictionary<K, V>> {
    ObjectDictionary::with_config(config).map(Stamped::new)
}
