//! Per-instance tuning for the hash containers.

use crate::error::ConfigError;

/// Smallest bucket count of a live table. Matches the metadata group width
/// so a fresh table is scanned in one group load.
pub(crate) const MIN_BUCKETS: usize = 8;

/// Maximum ratio of records to home buckets before a hash table grows.
///
/// Growth doubles the bucket count. A table with `b` home buckets holds
/// `floor(b * max_load)` records without rehashing (at least one).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaxLoad(f32);

impl MaxLoad {
    /// 7/8, the threshold used when none is configured.
    pub const DEFAULT: MaxLoad = MaxLoad(0.875);

    /// Validate a load factor. Accepts `0 < f <= 1`.
    pub fn new(f: f32) -> Result<Self, ConfigError> {
        if f > 0.0 && f <= 1.0 {
            Ok(MaxLoad(f))
        } else {
            Err(ConfigError::MaxLoadOutOfRange(f))
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Records a table with `buckets` home buckets may hold before growing.
    pub(crate) fn records_for(self, buckets: usize) -> usize {
        let n = (buckets as f64 * self.0 as f64) as usize;
        n.clamp(1, buckets.max(1))
    }

    /// Smallest power-of-two bucket count (at least `MIN_BUCKETS`) that
    /// holds `records` without growing, or `None` on overflow.
    pub(crate) fn buckets_for(self, records: usize) -> Option<usize> {
        let mut buckets = MIN_BUCKETS;
        while self.records_for(buckets) < records {
            buckets = buckets.checked_mul(2)?;
        }
        Some(buckets)
    }
}

impl Default for MaxLoad {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(MaxLoad::new(0.0).is_err());
        assert!(MaxLoad::new(-0.5).is_err());
        assert!(MaxLoad::new(1.01).is_err());
        assert!(MaxLoad::new(f32::NAN).is_err());
        assert_eq!(MaxLoad::new(1.0).unwrap().get(), 1.0);
    }

    #[test]
    fn bucket_sizing() {
        let ml = MaxLoad::DEFAULT;
        assert_eq!(ml.records_for(8), 7);
        assert_eq!(ml.buckets_for(0), Some(8));
        assert_eq!(ml.buckets_for(7), Some(8));
        assert_eq!(ml.buckets_for(8), Some(16));
        assert_eq!(ml.buckets_for(usize::MAX), None);

        let tiny = MaxLoad::new(0.01).unwrap();
        // Never zero: a live table always accepts one record.
        assert_eq!(tiny.records_for(8), 1);
    }
}
