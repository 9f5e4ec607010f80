//! Construction parameters for `ObjectDictionary`.

use crate::error::{CollectionError, Result};

pub const DEFAULT_INITIAL_BUCKETS: usize = 16;
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Sizing knobs for a dictionary's bucket array.
///
/// `initial_buckets` is rounded up to the next power of two when the
/// dictionary is built. `load_factor` is the entries-per-bucket ratio that,
/// once exceeded, doubles the bucket array.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DictionaryConfig {
    pub initial_buckets: usize,
    pub load_factor: f32,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            initial_buckets: DEFAULT_INITIAL_BUCKETS,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl DictionaryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_buckets(mut self, buckets: usize) -> Self {
        self.initial_buckets = buckets;
        self
    }

    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Pre-size the bucket array so that `entries` insertions do not rehash.
    pub fn for_entries(mut self, entries: usize) -> Self {
        let needed = (entries as f64 / self.load_factor.max(f32::MIN_POSITIVE) as f64).ceil();
        self.initial_buckets = needed.min(usize::MAX as f64) as usize;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(CollectionError::InvalidLoadFactor(self.load_factor));
        }
        self.bucket_count().map(|_| ())
    }

    /// Effective bucket count: `initial_buckets` rounded up to a power of two,
    /// never less than one.
    pub(crate) fn bucket_count(&self) -> Result<usize> {
        self.initial_buckets
            .max(1)
            .checked_next_power_of_two()
            .ok_or(CollectionError::InvalidBucketCount(self.initial_buckets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = DictionaryConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.bucket_count(), Ok(16));
    }

    #[test]
    fn bucket_count_rounds_up_to_power_of_two() {
        assert_eq!(DictionaryConfig::new().initial_buckets(0).bucket_count(), Ok(1));
        assert_eq!(DictionaryConfig::new().initial_buckets(5).bucket_count(), Ok(8));
        assert_eq!(DictionaryConfig::new().initial_buckets(64).bucket_count(), Ok(64));
    }

    #[test]
    fn rejects_non_positive_or_nan_load_factor() {
        for lf in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            match DictionaryConfig::new().load_factor(lf).validate() {
                Err(CollectionError::InvalidLoadFactor(_)) => {}
                other => panic!("unexpected result for {lf}: {:?}", other),
            }
        }
    }

    #[test]
    fn rejects_unroundable_bucket_count() {
        let c = DictionaryConfig::new().initial_buckets(usize::MAX);
        assert_eq!(
            c.validate(),
            Err(CollectionError::InvalidBucketCount(usize::MAX))
        );
    }

    #[test]
    fn for_entries_sizes_past_threshold() {
        let c = DictionaryConfig::new().for_entries(100);
        assert!(c.initial_buckets as f32 * c.load_factor >= 100.0);
    }
}
