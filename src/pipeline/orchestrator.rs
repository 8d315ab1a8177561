// file: src/pipeline/orchestrator.rs
// description: periodic refresh turning the store's change log into a published answer cache
// reference: orchestrates asynchronous classification and rebuild workflow

use crate::cache::{AnswerCache, AnswerPublisher, RecencyBuckets};
use crate::classifier::{ClassifySettings, NewsModels, classify_document, prepare_document};
use crate::cluster::ClusterBuilder;
use crate::config::Config;
use crate::error::{NewsError, Result};
use crate::models::{ChangeRecord, ClassifiedDocument, DocumentState};
use crate::parser::{HtmlExtractor, Tokenizer};
use crate::pipeline::stats::CycleStats;
use crate::store::DocumentStore;
use crate::utils::timer::StageTimer;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

enum Folded {
    Upsert(String, Result<ClassifiedDocument>),
    Remove(String),
}

/// Parses every upserted record. A panic while parsing one document marks
/// only that document as malformed.
fn parse_records<F>(records: Vec<ChangeRecord>, parse: F) -> Vec<Folded>
where
    F: Fn(&ChangeRecord) -> Result<ClassifiedDocument>,
{
    records
        .into_iter()
        .map(|record| match record.state {
            DocumentState::Removed => Folded::Remove(record.document.name),
            DocumentState::Added | DocumentState::Changed => {
                let parsed = panic::catch_unwind(AssertUnwindSafe(|| parse(&record)))
                    .unwrap_or_else(|_| {
                        Err(NewsError::malformed(
                            record.name(),
                            "parser panicked on this document",
                        ))
                    });
                Folded::Upsert(record.document.name, parsed)
            }
        })
        .collect()
}

pub struct RefreshPipeline {
    store: DocumentStore,
    models: Arc<dyn NewsModels>,
    tokenizer: Arc<Tokenizer>,
    settings: Arc<ClassifySettings>,
    builder: Arc<ClusterBuilder>,
    buckets: RecencyBuckets,
    fresh_boost: f32,
    publisher: Arc<AnswerPublisher>,
    parallel_workers: usize,
    working_set: HashMap<String, ClassifiedDocument>,
    generation: u64,
    needs_rebuild: bool,
}

impl RefreshPipeline {
    pub fn new(
        config: &Config,
        store: DocumentStore,
        models: Arc<dyn NewsModels>,
        publisher: Arc<AnswerPublisher>,
    ) -> Result<Self> {
        let buckets = RecencyBuckets::new(config.cache.bucket_secs.clone())?;
        let settings = ClassifySettings {
            min_language_confidence: config.classifier.min_language_confidence,
            embedding_dim: config.clustering.embedding_dim,
        };

        Ok(Self {
            store,
            models,
            tokenizer: Arc::new(Tokenizer::new()),
            settings: Arc::new(settings),
            builder: Arc::new(ClusterBuilder::new(config.clustering.clone())),
            buckets,
            fresh_boost: config.cache.fresh_boost,
            publisher: publisher.clone(),
            parallel_workers: config.pipeline.parallel_workers.max(1),
            working_set: HashMap::new(),
            generation: publisher.load().generation(),
            needs_rebuild: false,
        })
    }

    pub fn working_set_len(&self) -> usize {
        self.working_set.len()
    }

    fn has_pending(&self) -> bool {
        self.working_set.values().any(|doc| !doc.classified)
    }

    /// One refresh. Returns `None` when no new generation was published.
    ///
    /// Pending classifications are retried every cycle, but clusters and
    /// the cache are only rebuilt when the working set actually changed.
    pub async fn run_cycle(&mut self) -> Result<Option<CycleStats>> {
        let records = self.store.drain_change_log().await?;

        if records.is_empty() && !self.has_pending() && !self.needs_rebuild {
            return Ok(None);
        }

        let started = Instant::now();
        let mut stats = CycleStats::new();
        let drained = !records.is_empty();

        self.fold(records, &mut stats).await?;
        self.classify_pending(&mut stats).await;

        if !drained && stats.classified == 0 && !self.needs_rebuild {
            debug!(
                "Retried {} pending documents without success, keeping generation {}",
                stats.classification_failed, self.generation
            );
            return Ok(None);
        }

        self.needs_rebuild = true;
        self.rebuild(&mut stats).await?;
        self.needs_rebuild = false;

        stats.duration = started.elapsed();
        Ok(Some(stats))
    }

    /// Applies drained records to the working set in log order.
    async fn fold(&mut self, records: Vec<ChangeRecord>, stats: &mut CycleStats) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        for record in &records {
            match record.state {
                DocumentState::Added => stats.added += 1,
                DocumentState::Changed => stats.changed += 1,
                DocumentState::Removed => stats.removed += 1,
            }
        }

        let timer = StageTimer::start("parse");
        let count = records.len();
        let folded = tokio::task::spawn_blocking(move || {
            let extractor = HtmlExtractor::new();
            parse_records(records, |record| prepare_document(&extractor, record))
        })
        .await?;
        timer.finish_with_count(count);

        for change in folded {
            match change {
                Folded::Upsert(name, Ok(doc)) => {
                    self.working_set.insert(name, doc);
                }
                Folded::Upsert(name, Err(e)) => {
                    warn!("Dropping {}: {}", name, e);
                    stats.malformed += 1;
                    self.working_set.remove(&name);
                }
                Folded::Remove(name) => {
                    self.working_set.remove(&name);
                }
            }
        }

        Ok(())
    }

    /// Classifies every unclassified document; failures stay pending for the next cycle.
    async fn classify_pending(&mut self, stats: &mut CycleStats) {
        let pending: Vec<ClassifiedDocument> = self
            .working_set
            .values()
            .filter(|doc| !doc.classified)
            .cloned()
            .collect();

        if pending.is_empty() {
            return;
        }

        let timer = StageTimer::start("classify");
        let count = pending.len();

        let tasks = pending.into_iter().map(|mut doc| {
            let models = self.models.clone();
            let tokenizer = self.tokenizer.clone();
            let settings = self.settings.clone();

            async move {
                let name = doc.name.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    let result =
                        classify_document(&mut doc, models.as_ref(), &tokenizer, &settings);
                    (doc, result)
                })
                .await;
                (name, outcome)
            }
        });

        let results: Vec<_> = stream::iter(tasks)
            .buffer_unordered(self.parallel_workers)
            .collect()
            .await;

        for (name, outcome) in results {
            match outcome {
                Ok((doc, result)) => {
                    match result {
                        Ok(()) => stats.classified += 1,
                        Err(e) => {
                            warn!("Classification of {} failed, will retry: {}", name, e);
                            stats.classification_failed += 1;
                        }
                    }
                    if let Some(slot) = self.working_set.get_mut(&name) {
                        *slot = doc;
                    }
                }
                Err(e) => {
                    error!("Classification task for {} panicked: {}", name, e);
                    stats.classification_failed += 1;
                }
            }
        }

        timer.finish_with_count(count);
    }

    /// Full clustering pass and cache rebuild, then publish.
    async fn rebuild(&mut self, stats: &mut CycleStats) -> Result<()> {
        let documents: Vec<ClassifiedDocument> = self
            .working_set
            .values()
            .filter(|doc| doc.classified && doc.embedding.is_some())
            .cloned()
            .collect();

        let generation = self.generation + 1;
        let builder = self.builder.clone();
        let buckets = self.buckets.clone();
        let fresh_boost = self.fresh_boost;

        let timer = StageTimer::start("rebuild");
        let count = documents.len();
        let (cache, threads) = tokio::task::spawn_blocking(move || {
            let clusters = builder.build(&documents);
            let threads = clusters.len();
            (
                AnswerCache::build(&clusters, buckets, fresh_boost, generation),
                threads,
            )
        })
        .await
        .map_err(|e| NewsError::Task(format!("cache rebuild failed: {}", e)))?;
        timer.finish_with_count(count);

        self.publisher.publish(cache);
        self.generation = generation;

        stats.generation = generation;
        stats.documents = self.working_set.len();
        stats.threads = threads;
        Ok(())
    }

    /// Runs cycles on a fixed interval until the store shuts down.
    pub fn spawn(mut self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Refresh pipeline running every {:?}", every);

            loop {
                ticker.tick().await;
                match self.run_cycle().await {
                    Ok(Some(stats)) => stats.log_summary(),
                    Ok(None) => debug!("No changes since last refresh"),
                    Err(NewsError::StoreClosed) => {
                        info!("Document store closed, stopping refresh pipeline");
                        break;
                    }
                    Err(e) => error!("Refresh cycle failed, keeping previous answers: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RecencyBuckets;
    use crate::classifier::tests::FixedModels;
    use crate::store::ManualClock;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn page(title: &str) -> String {
        format!(
            "<html><head><meta property=\"og:title\" content=\"{}\"/>\
             <meta property=\"og:url\" content=\"https://example.com/{}\"/></head>\
             <body><article><p>The match ended in a draw.</p></article></body></html>",
            title, title
        )
    }

    struct Harness {
        _dir: TempDir,
        clock: ManualClock,
        store: DocumentStore,
        publisher: Arc<AnswerPublisher>,
        pipeline: RefreshPipeline,
    }

    async fn harness(models: FixedModels) -> Harness {
        harness_with(Arc::new(models)).await
    }

    async fn harness_with(models: Arc<FixedModels>) -> Harness {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::new(10_000);
        let store = DocumentStore::open(dir.path(), Arc::new(clock.clone()))
            .await
            .unwrap();

        let mut config = Config::default_config();
        config.clustering.embedding_dim = 2;

        let publisher = Arc::new(AnswerPublisher::new(AnswerCache::empty(
            RecencyBuckets::default(),
        )));
        let pipeline =
            RefreshPipeline::new(&config, store.clone(), models, publisher.clone())
                .unwrap();

        Harness {
            _dir: dir,
            clock,
            store,
            publisher,
            pipeline,
        }
    }

    fn threads_for(publisher: &AnswerPublisher, category: &str) -> Vec<String> {
        publisher
            .load()
            .get_answer("en", category, 3_600)
            .unwrap()
            .iter()
            .flat_map(|thread| thread.articles.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_expired_document_leaves_threads() {
        let mut h = harness(FixedModels::english("sports", vec![1.0, 0.0])).await;

        h.store.put("a.html", page("a"), 60).await.unwrap();
        let stats = h.pipeline.run_cycle().await.unwrap().unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.classified, 1);
        assert_eq!(threads_for(&h.publisher, "sports"), vec!["a.html"]);
        assert_eq!(threads_for(&h.publisher, "any"), vec!["a.html"]);

        h.clock.advance(60);
        assert_eq!(h.store.expire_outdated().await.unwrap(), 1);
        assert!(matches!(
            h.store.is_alive("a.html").await,
            Err(NewsError::NotFound(_))
        ));

        let stats = h.pipeline.run_cycle().await.unwrap().unwrap();
        assert_eq!(stats.removed, 1);
        assert!(threads_for(&h.publisher, "any").is_empty());
        assert_eq!(h.pipeline.working_set_len(), 0);
    }

    #[tokio::test]
    async fn test_idle_cycle_is_skipped() {
        let mut h = harness(FixedModels::english("sports", vec![1.0, 0.0])).await;
        assert!(h.pipeline.run_cycle().await.unwrap().is_none());

        h.store.put("a.html", page("a"), 60).await.unwrap();
        assert!(h.pipeline.run_cycle().await.unwrap().is_some());
        assert!(h.pipeline.run_cycle().await.unwrap().is_none());
        assert_eq!(h.publisher.load().generation(), 1);
    }

    #[tokio::test]
    async fn test_malformed_document_is_dropped() {
        let mut h = harness(FixedModels::english("sports", vec![1.0, 0.0])).await;

        h.store.put("good.html", page("good"), 60).await.unwrap();
        h.store
            .put("bad.html", "not html at all".to_string(), 60)
            .await
            .unwrap();

        let stats = h.pipeline.run_cycle().await.unwrap().unwrap();
        assert_eq!(stats.malformed, 1);
        assert_eq!(h.pipeline.working_set_len(), 1);
        assert_eq!(threads_for(&h.publisher, "any"), vec!["good.html"]);
    }

    #[tokio::test]
    async fn test_failed_classification_is_retried() {
        let models = FixedModels::english("sports", vec![1.0, 0.0]);
        models.failing_embeds.store(1, Ordering::SeqCst);
        let mut h = harness(models).await;

        h.store.put("a.html", page("a"), 60).await.unwrap();
        let stats = h.pipeline.run_cycle().await.unwrap().unwrap();
        assert_eq!(stats.classification_failed, 1);
        assert!(threads_for(&h.publisher, "any").is_empty());

        let stats = h.pipeline.run_cycle().await.unwrap().unwrap();
        assert_eq!(stats.changes(), 0);
        assert_eq!(stats.classified, 1);
        assert_eq!(threads_for(&h.publisher, "any"), vec!["a.html"]);
    }

    #[tokio::test]
    async fn test_stuck_document_does_not_republish() {
        let models = Arc::new(FixedModels::english("sports", vec![1.0, 0.0]));
        models.failing_embeds.store(100, Ordering::SeqCst);
        let mut h = harness_with(models.clone()).await;

        h.store.put("a.html", page("a"), 600).await.unwrap();
        assert!(h.pipeline.run_cycle().await.unwrap().is_some());
        assert_eq!(h.publisher.load().generation(), 1);

        for _ in 0..3 {
            assert!(h.pipeline.run_cycle().await.unwrap().is_none());
        }
        assert_eq!(h.publisher.load().generation(), 1);
        assert_eq!(models.failing_embeds.load(Ordering::SeqCst), 96);
    }

    #[test]
    fn test_parse_panic_spares_the_batch() {
        let record = |name: &str, state: DocumentState| ChangeRecord {
            document: crate::models::StoredDocument::new(name, page(name), 100),
            state,
            recorded_at: 10,
        };
        let records = vec![
            record("boom.html", DocumentState::Added),
            record("good.html", DocumentState::Changed),
            record("gone.html", DocumentState::Removed),
        ];

        let extractor = HtmlExtractor::new();
        let folded = parse_records(records, |record| {
            if record.name() == "boom.html" {
                panic!("extractor bug");
            }
            prepare_document(&extractor, record)
        });

        assert_eq!(folded.len(), 3);
        assert!(matches!(
            &folded[0],
            Folded::Upsert(name, Err(NewsError::MalformedInput { .. })) if name == "boom.html"
        ));
        assert!(matches!(&folded[1], Folded::Upsert(name, Ok(_)) if name == "good.html"));
        assert!(matches!(&folded[2], Folded::Remove(name) if name == "gone.html"));
    }

    #[tokio::test]
    async fn test_near_duplicates_form_one_thread() {
        let mut h = harness(FixedModels::english("sports", vec![1.0, 0.0])).await;

        h.store.put("a.html", page("a"), 600).await.unwrap();
        h.store.put("b.html", page("b"), 600).await.unwrap();
        h.pipeline.run_cycle().await.unwrap();

        let cache = h.publisher.load();
        let threads = cache.get_answer("en", "sports", 3_600).unwrap();
        assert_eq!(threads.len(), 1);
        let mut articles = threads[0].articles.clone();
        articles.sort();
        assert_eq!(articles, vec!["a.html", "b.html"]);
    }
}
