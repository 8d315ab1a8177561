// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod cache;
pub mod classifier;
pub mod cluster;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod utils;

pub use cache::{AnswerCache, AnswerPublisher, RecencyBuckets};
pub use classifier::{LexiconModels, NewsModels};
pub use cluster::{Cluster, ClusterBuilder};
pub use config::{CacheConfig, ClassifierConfig, ClusteringConfig, Config, PipelineConfig};
pub use error::{NewsError, Result};
pub use models::{Category, ClassifiedDocument, Language, ThreadEntry, ThreadsResponse};
pub use pipeline::{CycleStats, RefreshPipeline, classify_directory};
pub use server::{AppState, run_server};
pub use store::{Clock, DocumentStore, ManualClock, SystemClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        let buckets = RecencyBuckets::new(config.cache.bucket_secs.clone()).unwrap();
        let cache = AnswerCache::empty(buckets);
        assert_eq!(cache.generation(), 0);
        assert!(cache.get_answer("en", "any", 60).unwrap().is_empty());
    }
}
