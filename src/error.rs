//! Error type shared by the fallible entry points of the crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectionError {
    /// Index outside the live prefix `[0, len)`.
    #[error("index out of bounds: the len is {len} but the index is {index}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Load factor that is zero, negative, or not finite.
    #[error("invalid load factor: {0}")]
    InvalidLoadFactor(f32),

    /// Bucket count that cannot be rounded up to a power of two.
    #[error("invalid bucket count: {0}")]
    InvalidBucketCount(usize),
}

impl CollectionError {
    pub(crate) fn out_of_bounds(index: usize, len: usize) -> Self {
        CollectionError::IndexOutOfBounds { index, len }
    }
}
