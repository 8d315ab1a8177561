// file: src/pipeline/stats.rs
// description: per cycle counters for the refresh pipeline
// reference: processing metrics reported after each cycle

use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStats {
    pub added: usize,
    pub changed: usize,
    pub removed: usize,
    pub malformed: usize,
    pub classified: usize,
    pub classification_failed: usize,
    pub documents: usize,
    pub threads: usize,
    pub generation: u64,
    pub duration: Duration,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> usize {
        self.added + self.changed + self.removed
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.classified + self.classification_failed;
        if total == 0 {
            return 100.0;
        }
        (self.classified as f64 / total as f64) * 100.0
    }

    pub fn log_summary(&self) {
        info!(
            "Refresh generation {}: +{} ~{} -{} changes, {} malformed, {} classified ({:.1}% ok), {} documents in {} threads, {} ms",
            self.generation,
            self.added,
            self.changed,
            self.removed,
            self.malformed,
            self.classified,
            self.success_rate(),
            self.documents,
            self.threads,
            self.duration.as_millis()
        );
    }
}
