// file: src/classifier/lexicon.rs
// description: lightweight rule based language, category, embedding and authority models
// reference: configurable keyword classification

use crate::classifier::NewsModels;
use crate::config::{AuthorityRule, CategoryRule, ClassifierConfig};
use crate::error::Result;
use crate::models::Language;
use lazy_static::lazy_static;
use std::collections::HashSet;

/// Only the first tokens of a text contribute to its embedding.
const MAX_EMBEDDED_TOKENS: usize = 100;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

lazy_static! {
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "of", "to", "in", "on", "at", "for", "with", "is", "are",
        "was", "were", "be", "been", "has", "have", "had", "it", "its", "this", "that", "by",
        "from", "as", "after", "before", "will", "said", "says", "not", "but", "his", "her",
        "their", "they", "he", "she", "we", "you",
    ]
    .into_iter()
    .collect();

    static ref RUSSIAN_STOPWORDS: HashSet<&'static str> = [
        "и", "в", "во", "не", "что", "он", "на", "я", "с", "со", "как", "а", "то", "все", "она",
        "так", "его", "но", "да", "к", "у", "же", "вы", "за", "бы", "по", "от", "из", "о", "об",
        "для", "это", "был", "была", "были", "при", "после",
    ]
    .into_iter()
    .collect();
}

pub struct LexiconModels {
    categories: Vec<CategoryRule>,
    authority: Vec<AuthorityRule>,
    default_authority: f32,
    embedding_dim: usize,
}

impl LexiconModels {
    pub fn new(config: &ClassifierConfig, embedding_dim: usize) -> Self {
        let categories = config
            .categories
            .iter()
            .map(|rule| CategoryRule {
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
                category: rule.category.clone(),
            })
            .collect();

        let authority = config
            .authority
            .iter()
            .map(|rule| AuthorityRule {
                domain: rule.domain.trim().trim_start_matches("www.").to_lowercase(),
                score: rule.score,
            })
            .collect();

        Self {
            categories,
            authority,
            default_authority: config.default_authority,
            embedding_dim,
        }
    }

    /// Highest keyword hit count wins; earlier rules win ties.
    fn best_category(&self, text: &str) -> Option<&str> {
        let words: Vec<String> = words(text).map(|w| w.to_lowercase()).collect();

        let mut best: Option<(&str, usize)> = None;
        for rule in &self.categories {
            let hits = words
                .iter()
                .filter(|w| rule.keywords.iter().any(|k| k == *w))
                .count();
            if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
                best = Some((rule.category.as_str(), hits));
            }
        }

        best.map(|(category, _)| category)
    }

    fn host_of(url: &str) -> Option<String> {
        let rest = url
            .trim()
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(url.trim());
        let host = rest.split(['/', '?', '#']).next()?;
        let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
        let host = host.split(':').next()?.to_lowercase();
        let host = host.trim_start_matches("www.").to_string();
        (!host.is_empty()).then_some(host)
    }
}

impl NewsModels for LexiconModels {
    fn detect_language(&self, text: &str) -> Result<Option<(String, f32)>> {
        let mut cyrillic = 0usize;
        let mut latin = 0usize;
        for ch in text.chars().filter(|c| c.is_alphabetic()) {
            if ('\u{0400}'..='\u{04FF}').contains(&ch) {
                cyrillic += 1;
            } else if ch.is_ascii_alphabetic() {
                latin += 1;
            }
        }

        let letters = cyrillic + latin;
        if letters == 0 {
            return Ok(None);
        }

        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = words(&lowered).collect();

        if cyrillic >= latin {
            let confidence = cyrillic as f32 / letters as f32;
            return Ok(Some(("ru".to_string(), confidence)));
        }

        let stopwords = tokens
            .iter()
            .filter(|t| ENGLISH_STOPWORDS.contains(*t))
            .count();
        if stopwords == 0 {
            // Latin script without English function words.
            return Ok(None);
        }

        let russian = tokens
            .iter()
            .filter(|t| RUSSIAN_STOPWORDS.contains(*t))
            .count();
        let script = latin as f32 / letters as f32;
        let lexical = stopwords as f32 / (stopwords + russian) as f32;
        Ok(Some(("en".to_string(), script.min(lexical))))
    }

    fn classify(&self, _language: Language, text: &str) -> Result<Option<String>> {
        let category = self.best_category(text).unwrap_or("other");
        Ok(Some(category.to_string()))
    }

    fn embed(&self, _language: Language, text: &str) -> Result<Option<Vec<f32>>> {
        let mut vector = vec![0.0f32; self.embedding_dim];
        let mut seen = 0usize;

        for token in words(text).take(MAX_EMBEDDED_TOKENS) {
            let hash = fnv1a(&token.to_lowercase());
            let index = (hash % self.embedding_dim as u64) as usize;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
            seen += 1;
        }

        if seen == 0 || vector.iter().all(|v| *v == 0.0) {
            return Ok(None);
        }

        Ok(Some(vector))
    }

    fn score_authority(&self, url: &str) -> Result<Option<f32>> {
        let Some(host) = Self::host_of(url) else {
            return Ok(None);
        };

        let score = self
            .authority
            .iter()
            .find(|rule| host == rule.domain || host.ends_with(&format!(".{}", rule.domain)))
            .map(|rule| rule.score)
            .unwrap_or(self.default_authority);

        Ok(Some(score))
    }
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn models() -> LexiconModels {
        let mut config = Config::default_config().classifier;
        config.authority = vec![AuthorityRule {
            domain: "www.example.com".to_string(),
            score: 0.9,
        }];
        LexiconModels::new(&config, 50)
    }

    #[test]
    fn test_detects_english_and_russian() {
        let models = models();

        let (code, confidence) = models
            .detect_language("The president said that the election was fair")
            .unwrap()
            .unwrap();
        assert_eq!(code, "en");
        assert!(confidence > 0.9);

        let (code, confidence) = models
            .detect_language("Президент заявил, что выборы прошли честно")
            .unwrap()
            .unwrap();
        assert_eq!(code, "ru");
        assert!(confidence > 0.9);
    }

    #[test]
    fn test_unknown_language() {
        let models = models();
        assert!(models.detect_language("1234 !!!").unwrap().is_none());
        assert!(models.detect_language("Der Hund spielt im Garten").unwrap().is_none());
    }

    #[test]
    fn test_keyword_categories() {
        let models = models();
        assert_eq!(
            models
                .classify(Language::En, "the coach praised the team after the match")
                .unwrap()
                .as_deref(),
            Some("sports")
        );
        assert_eq!(
            models
                .classify(Language::Ru, "банк снизил ставки , рынок вырос")
                .unwrap()
                .as_deref(),
            Some("economy")
        );
        assert_eq!(
            models.classify(Language::En, "a quiet afternoon").unwrap().as_deref(),
            Some("other")
        );
    }

    #[test]
    fn test_embedding_is_deterministic() {
        let models = models();
        let first = models.embed(Language::En, "cup final draw").unwrap().unwrap();
        let second = models.embed(Language::En, "cup final draw").unwrap().unwrap();
        assert_eq!(first.len(), 50);
        assert_eq!(first, second);
        assert!(models.embed(Language::En, " , . ").unwrap().is_none());
    }

    #[test]
    fn test_authority_table() {
        let models = models();
        assert_eq!(
            models.score_authority("https://news.example.com/a").unwrap(),
            Some(0.9)
        );
        assert_eq!(
            models.score_authority("https://www.example.com:8080/a?b").unwrap(),
            Some(0.9)
        );
        assert_eq!(
            models.score_authority("https://other.org/a").unwrap(),
            Some(0.1)
        );
        assert_eq!(models.score_authority("").unwrap(), None);
    }
}
