// file: src/cluster/mod.rs
// description: per language thread building over classified documents
// reference: internal module structure

pub mod agglomerative;
pub mod thread;

pub use agglomerative::{cosine_distance, single_link_labels};
pub use thread::{Cluster, ThreadMember};

use crate::config::ClusteringConfig;
use crate::models::{ClassifiedDocument, Language};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    config: ClusteringConfig,
}

impl ClusterBuilder {
    pub fn new(config: ClusteringConfig) -> Self {
        Self { config }
    }

    /// Full clustering pass. Result is ordered by descending cluster time.
    pub fn build<'a, I>(&self, documents: I) -> Vec<Cluster>
    where
        I: IntoIterator<Item = &'a ClassifiedDocument>,
    {
        let documents: Vec<&ClassifiedDocument> = documents.into_iter().collect();
        let mut clusters = Vec::new();

        for language in Language::ALL {
            let eligible: Vec<&ClassifiedDocument> = documents
                .iter()
                .copied()
                .filter(|doc| self.is_eligible(doc, language))
                .collect();

            if eligible.is_empty() {
                continue;
            }

            let points: Vec<Vec<f32>> = eligible
                .iter()
                .filter_map(|doc| doc.embedding.clone())
                .collect();
            let threshold = self.config.thresholds.for_language(language);
            let labels = single_link_labels(&points, threshold);

            let mut groups: Vec<Vec<ThreadMember>> = vec![Vec::new(); eligible.len()];
            for (doc, label) in eligible.iter().zip(labels) {
                groups[label].push(ThreadMember::from(*doc));
            }

            let before = clusters.len();
            clusters.extend(
                groups
                    .into_iter()
                    .filter_map(|members| Cluster::new(language, members)),
            );
            debug!(
                "Clustered {} {} documents into {} threads",
                eligible.len(),
                language,
                clusters.len() - before
            );
        }

        clusters.sort_by(|a, b| b.time().cmp(&a.time()));
        clusters
    }

    fn is_eligible(&self, doc: &ClassifiedDocument, language: Language) -> bool {
        doc.known_language() == Some(language)
            && doc.is_news()
            && doc
                .embedding
                .as_ref()
                .is_some_and(|e| e.len() == self.config.embedding_dim)
    }
}
