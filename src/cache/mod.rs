// file: src/cache/mod.rs
// description: recency bucketed answer cache and its publication point
// reference: internal module structure

pub mod answers;
pub mod buckets;
pub mod summary;

pub use answers::AnswerCache;
pub use buckets::RecencyBuckets;

use std::sync::{Arc, RwLock};
use tracing::info;

/// Holds the current cache generation. Readers clone the `Arc` and never
/// observe a partially built table.
#[derive(Debug)]
pub struct AnswerPublisher {
    current: RwLock<Arc<AnswerCache>>,
}

impl AnswerPublisher {
    pub fn new(initial: AnswerCache) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn load(&self) -> Arc<AnswerCache> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn publish(&self, cache: AnswerCache) {
        let generation = cache.generation();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(cache);
        drop(guard);
        info!("Published answer cache generation {}", generation);
    }
}
