// file: src/cache/summary.rs
// description: one-shot answers for batch mode over a directory of articles

use crate::cluster::Cluster;
use crate::models::{Category, ClassifiedDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageAnswer {
    pub lang_code: String,
    pub articles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsAnswer {
    pub articles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAnswer {
    pub category: String,
    pub articles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub title: String,
    pub articles: Vec<String>,
}

/// Articles grouped by detected language code, codes sorted.
pub fn languages(documents: &[ClassifiedDocument]) -> Vec<LanguageAnswer> {
    let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for doc in documents {
        if let Some(code) = doc.language_code() {
            grouped.entry(code).or_default().push(doc.name.clone());
        }
    }

    grouped
        .into_iter()
        .map(|(code, mut articles)| {
            articles.sort();
            LanguageAnswer {
                lang_code: code.to_string(),
                articles,
            }
        })
        .collect()
}

/// Articles in a supported language that are classified as news.
pub fn news(documents: &[ClassifiedDocument]) -> NewsAnswer {
    let mut articles: Vec<String> = documents
        .iter()
        .filter(|doc| doc.known_language().is_some() && doc.is_news())
        .map(|doc| doc.name.clone())
        .collect();
    articles.sort();
    NewsAnswer { articles }
}

/// News articles per topic category, in category order. "any" is omitted.
pub fn categories(documents: &[ClassifiedDocument]) -> Vec<CategoryAnswer> {
    Category::SLOTS
        .iter()
        .filter(|category| **category != Category::Any)
        .map(|category| {
            let mut articles: Vec<String> = documents
                .iter()
                .filter(|doc| doc.known_language().is_some() && doc.category == Some(*category))
                .map(|doc| doc.name.clone())
                .collect();
            articles.sort();
            CategoryAnswer {
                category: category.name().to_string(),
                articles,
            }
        })
        .collect()
}

/// Threads ranked by weight, heaviest first.
pub fn threads(clusters: &[Cluster]) -> Vec<ThreadSummary> {
    let mut ranked: Vec<&Cluster> = clusters.iter().collect();
    ranked.sort_by(|a, b| b.weight().total_cmp(&a.weight()));

    ranked
        .into_iter()
        .map(|cluster| ThreadSummary {
            title: cluster.title().to_string(),
            articles: cluster.article_names(),
        })
        .collect()
}
