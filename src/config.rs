// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{NewsError, Result};
use crate::models::{Category, Language};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Recency windows in seconds, ascending.
pub const DEFAULT_BUCKET_SECS: [u64; 12] = [
    300, 1_800, 3_600, 14_400, 28_800, 86_400, 172_800, 345_600, 604_800, 1_209_600, 1_814_400,
    2_592_000,
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub content_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub refresh_interval_secs: u64,
    pub parallel_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 5,
            parallel_workers: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct LanguageThresholds {
    pub en: f32,
    pub ru: f32,
}

impl LanguageThresholds {
    pub fn for_language(&self, language: Language) -> f32 {
        match language {
            Language::En => self.en,
            Language::Ru => self.ru,
        }
    }
}

impl Default for LanguageThresholds {
    fn default() -> Self {
        Self { en: 0.02, ru: 0.013 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusteringConfig {
    #[serde(default)]
    pub thresholds: LanguageThresholds,
    pub embedding_dim: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            thresholds: LanguageThresholds::default(),
            embedding_dim: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub bucket_secs: Vec<u64>,
    pub fresh_boost: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket_secs: DEFAULT_BUCKET_SECS.to_vec(),
            fresh_boost: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    pub min_language_confidence: f32,
    pub default_authority: f32,
    #[serde(default = "default_category_rules")]
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub authority: Vec<AuthorityRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_language_confidence: 0.4,
            default_authority: 0.1,
            categories: default_category_rules(),
            authority: vec![],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRule {
    pub keywords: Vec<String>,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthorityRule {
    pub domain: String,
    pub score: f32,
}

fn rule(category: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        category: category.to_string(),
    }
}

fn default_category_rules() -> Vec<CategoryRule> {
    vec![
        rule(
            "sports",
            &[
                "match", "goal", "league", "championship", "coach", "tournament", "football",
                "hockey", "tennis", "матч", "гол", "чемпионат", "тренер", "футбол", "хоккей",
            ],
        ),
        rule(
            "economy",
            &[
                "market", "inflation", "bank", "economy", "stocks", "gdp", "rates", "рынок",
                "инфляция", "банк", "экономика", "акции", "ввп",
            ],
        ),
        rule(
            "technology",
            &[
                "software", "smartphone", "startup", "app", "chip", "internet", "ai",
                "смартфон", "стартап", "приложение", "интернет",
            ],
        ),
        rule(
            "science",
            &[
                "scientists", "research", "study", "space", "nasa", "species", "учёные",
                "ученые", "исследование", "космос",
            ],
        ),
        rule(
            "entertainment",
            &[
                "film", "movie", "actor", "actress", "album", "singer", "celebrity", "фильм",
                "актёр", "актер", "певица", "альбом",
            ],
        ),
        rule(
            "society",
            &[
                "president", "government", "police", "election", "minister", "court",
                "президент", "правительство", "полиция", "выборы", "министр", "суд",
            ],
        ),
    ]
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NEWS_THREADS")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| NewsError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| NewsError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            store: StoreConfig::default(),
            server: ServerConfig::default(),
            pipeline: PipelineConfig::default(),
            clustering: ClusteringConfig::default(),
            cache: CacheConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(NewsError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.refresh_interval_secs == 0 {
            return Err(NewsError::Config(
                "refresh_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.clustering.embedding_dim == 0 {
            return Err(NewsError::Config(
                "embedding_dim must be greater than 0".to_string(),
            ));
        }

        for language in Language::ALL {
            let threshold = self.clustering.thresholds.for_language(language);
            if !(threshold > 0.0 && threshold <= 2.0) {
                return Err(NewsError::Config(format!(
                    "clustering threshold for {} must be in (0, 2], got {}",
                    language.code(),
                    threshold
                )));
            }
        }

        if self.cache.bucket_secs.is_empty() {
            return Err(NewsError::Config("bucket_secs must not be empty".to_string()));
        }

        if self.cache.bucket_secs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NewsError::Config(
                "bucket_secs must be strictly ascending".to_string(),
            ));
        }

        if self.cache.fresh_boost < 1.0 {
            return Err(NewsError::Config(
                "fresh_boost must be at least 1.0".to_string(),
            ));
        }

        for rule in &self.classifier.categories {
            if Category::from_label(&rule.category).is_none() {
                return Err(NewsError::Config(format!(
                    "unknown category in classifier rule: {}",
                    rule.category
                )));
            }
        }

        Ok(())
    }
}
