// file: src/cache/buckets.rs
// description: ascending recency windows and period lookup

use crate::config::DEFAULT_BUCKET_SECS;
use crate::error::{NewsError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyBuckets {
    bounds: Vec<u64>,
}

impl RecencyBuckets {
    pub fn new(bounds: Vec<u64>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(NewsError::Config("at least one bucket is required".to_string()));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NewsError::Config(
                "bucket durations must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { bounds })
    }

    /// Smallest bucket whose duration covers `period`; the last one if none does.
    pub fn index_for(&self, period: u64) -> usize {
        self.bounds
            .partition_point(|bound| *bound < period)
            .min(self.bounds.len() - 1)
    }

    pub fn durations(&self) -> &[u64] {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

impl Default for RecencyBuckets {
    fn default() -> Self {
        Self {
            bounds: DEFAULT_BUCKET_SECS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_for() {
        let buckets = RecencyBuckets::default();
        assert_eq!(buckets.index_for(0), 0);
        assert_eq!(buckets.index_for(300), 0);
        assert_eq!(buckets.index_for(301), 1);
        assert_eq!(buckets.index_for(86_400), 5);
        assert_eq!(buckets.index_for(u64::MAX), buckets.len() - 1);
    }

    #[test]
    fn test_rejects_invalid_bounds() {
        assert!(RecencyBuckets::new(vec![]).is_err());
        assert!(RecencyBuckets::new(vec![60, 60]).is_err());
        assert!(RecencyBuckets::new(vec![60, 120]).is_ok());
    }
}
