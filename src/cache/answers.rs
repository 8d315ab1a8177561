// file: src/cache/answers.rs
// description: immutable [bucket][category][language] table of ranked threads

use crate::cache::buckets::RecencyBuckets;
use crate::cluster::Cluster;
use crate::error::Result;
use crate::models::{Category, Language, ThreadEntry};
use tracing::debug;

const CATEGORY_SLOTS: usize = Category::SLOTS.len();
const LANGUAGES: usize = Language::ALL.len();

#[derive(Debug, Clone)]
pub struct AnswerCache {
    buckets: RecencyBuckets,
    cells: Vec<Vec<ThreadEntry>>,
    generation: u64,
    now: u64,
}

impl AnswerCache {
    /// A table with every cell empty.
    pub fn empty(buckets: RecencyBuckets) -> Self {
        let cells = vec![Vec::new(); buckets.len() * CATEGORY_SLOTS * LANGUAGES];
        Self {
            buckets,
            cells,
            generation: 0,
            now: 0,
        }
    }

    /// Builds every cell from a full clustering pass.
    ///
    /// "Now" is the newest cluster time, so the table does not depend on the
    /// wall clock.
    pub fn build(
        clusters: &[Cluster],
        buckets: RecencyBuckets,
        fresh_boost: f32,
        generation: u64,
    ) -> Self {
        let mut cache = Self::empty(buckets);
        cache.generation = generation;
        cache.now = clusters.iter().map(Cluster::time).max().unwrap_or(0);

        let mut by_recency: Vec<&Cluster> = clusters.iter().collect();
        by_recency.sort_by(|a, b| b.time().cmp(&a.time()));

        let any_slot = Category::Any.slot().unwrap_or(0);
        let now = cache.now;

        for (bucket, &duration) in cache.buckets.durations().to_vec().iter().enumerate() {
            let mut ranked: Vec<Vec<(f32, usize)>> =
                vec![Vec::new(); CATEGORY_SLOTS * LANGUAGES];

            for (position, cluster) in by_recency
                .iter()
                .enumerate()
                .take_while(|(_, c)| c.time().saturating_add(duration.saturating_mul(2)) >= now)
            {
                let mut weight = cluster.weight();
                if cluster.time().saturating_add(duration) >= now {
                    weight *= fresh_boost;
                }

                let language = cluster.language().index();
                if let Some(slot) = cluster.category().slot().filter(|s| *s != any_slot) {
                    ranked[slot * LANGUAGES + language].push((weight, position));
                }
                ranked[any_slot * LANGUAGES + language].push((weight, position));
            }

            for (offset, mut entries) in ranked.into_iter().enumerate() {
                entries.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
                let index = bucket * CATEGORY_SLOTS * LANGUAGES + offset;
                cache.cells[index] = entries
                    .into_iter()
                    .map(|(_, position)| by_recency[position].to_entry())
                    .collect();
            }
        }

        debug!(
            "Built answer cache generation {} from {} clusters (now = {})",
            generation,
            clusters.len(),
            now
        );
        cache
    }

    /// Threads for a language, category and look-back period in seconds.
    pub fn get_answer(
        &self,
        language: &str,
        category: &str,
        period: u64,
    ) -> Result<&[ThreadEntry]> {
        let language = Language::from_query(language)?;
        let category = Category::from_query(category)?;
        Ok(self.cell(self.buckets.index_for(period), category, language))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reference time the table was built against.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn buckets(&self) -> &RecencyBuckets {
        &self.buckets
    }

    fn cell(&self, bucket: usize, category: Category, language: Language) -> &[ThreadEntry] {
        let slot = category.slot().unwrap_or(0);
        let index = (bucket * CATEGORY_SLOTS + slot) * LANGUAGES + language.index();
        &self.cells[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ThreadMember;
    use crate::error::NewsError;
    use pretty_assertions::assert_eq;

    fn cluster(name: &str, category: Category, weight: f32, time: u64) -> Cluster {
        Cluster::new(
            Language::En,
            vec![ThreadMember {
                name: name.to_string(),
                title: name.to_string(),
                category,
                weight,
                fetch_time: time,
            }],
        )
        .unwrap()
    }

    fn names(entries: &[ThreadEntry]) -> Vec<String> {
        entries.iter().flat_map(|e| e.articles.clone()).collect()
    }

    #[test]
    fn test_sports_and_any_cells() {
        let clusters = vec![
            cluster("sports.html", Category::Sports, 1.0, 1_000),
            cluster("unknown.html", Category::Undefined, 1.0, 1_000),
        ];
        let cache = AnswerCache::build(&clusters, RecencyBuckets::default(), 1.5, 1);

        let sports = cache.get_answer("en", "sports", 3_600).unwrap();
        assert_eq!(names(sports), vec!["sports.html"]);

        let mut any = names(cache.get_answer("en", "any", 3_600).unwrap());
        any.sort();
        assert_eq!(any, vec!["sports.html", "unknown.html"]);

        assert!(cache.get_answer("ru", "any", 3_600).unwrap().is_empty());
    }

    #[test]
    fn test_any_category_listed_once() {
        let clusters = vec![cluster("any.html", Category::Any, 1.0, 50)];
        let cache = AnswerCache::build(&clusters, RecencyBuckets::default(), 1.5, 1);
        assert_eq!(cache.get_answer("en", "any", 300).unwrap().len(), 1);
    }

    #[test]
    fn test_bucket_monotonicity() {
        let clusters = vec![
            cluster("now.html", Category::Sports, 1.0, 100_000),
            cluster("hour.html", Category::Sports, 1.0, 100_000 - 3_000),
            cluster("day.html", Category::Sports, 1.0, 100_000 - 80_000),
        ];
        let cache = AnswerCache::build(&clusters, RecencyBuckets::default(), 1.5, 1);

        let mut previous: Vec<String> = Vec::new();
        for period in [300, 1_800, 3_600, 86_400, 2_592_000] {
            let current = names(cache.get_answer("en", "sports", period).unwrap());
            assert!(previous.iter().all(|name| current.contains(name)));
            previous = current;
        }

        assert_eq!(names(cache.get_answer("en", "sports", 300).unwrap()), vec!["now.html"]);
        assert_eq!(previous.len(), 3);
    }

    #[test]
    fn test_fresh_boost_reorders() {
        // older is heavier but only newer gets the boost in the 300s bucket.
        let clusters = vec![
            cluster("newer.html", Category::Sports, 1.0, 1_000),
            cluster("older.html", Category::Sports, 1.2, 1_000 - 500),
        ];
        let cache = AnswerCache::build(&clusters, RecencyBuckets::default(), 1.5, 1);

        assert_eq!(
            names(cache.get_answer("en", "sports", 300).unwrap()),
            vec!["newer.html", "older.html"]
        );
        assert_eq!(
            names(cache.get_answer("en", "sports", 1_800).unwrap()),
            vec!["older.html", "newer.html"]
        );
    }

    #[test]
    fn test_empty_and_unknown_parameters() {
        let cache = AnswerCache::build(&[], RecencyBuckets::default(), 1.5, 0);
        assert_eq!(cache.now(), 0);
        assert!(cache.get_answer("en", "any", 60).unwrap().is_empty());
        assert!(matches!(
            cache.get_answer("en", "weather", 60),
            Err(NewsError::UnknownCategory(_))
        ));
        assert!(matches!(
            cache.get_answer("de", "any", 60),
            Err(NewsError::UnknownLanguage(_))
        ));
    }
}
