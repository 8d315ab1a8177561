// file: src/models/article.rs
// description: parsed article and classified document models
// reference: internal data structures

use crate::models::{Category, Language};
use serde::{Deserialize, Serialize};

/// Fields extracted from an article's HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub site_name: String,
    pub title: String,
    pub description: String,
    pub text: String,
    pub author: Option<String>,
    pub published_at: Option<u64>,
}

/// Outcome of language detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum LanguageLabel {
    Undetermined,
    Detected(String),
}

/// Tokenized text handed to the category and embedding models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preprocessed {
    pub title: String,
    pub text: String,
}

impl Preprocessed {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.text.is_empty()
    }

    pub fn joined(&self) -> String {
        match (self.title.is_empty(), self.text.is_empty()) {
            (true, _) => self.text.clone(),
            (_, true) => self.title.clone(),
            _ => format!("{} {}", self.title, self.text),
        }
    }
}

/// A document plus everything the models derived from it.
///
/// `None` means "not computed yet". Each step runs once per content version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDocument {
    pub name: String,
    pub article: Article,
    pub fetch_time: u64,
    pub language: Option<LanguageLabel>,
    pub preprocessed: Option<Preprocessed>,
    pub category: Option<Category>,
    pub weight: Option<f32>,
    pub embedding: Option<Vec<f32>>,
    pub classified: bool,
}

impl ClassifiedDocument {
    pub fn new(name: impl Into<String>, article: Article, fetch_time: u64) -> Self {
        Self {
            name: name.into(),
            article,
            fetch_time,
            language: None,
            preprocessed: None,
            category: None,
            weight: None,
            embedding: None,
            classified: false,
        }
    }

    pub fn language_code(&self) -> Option<&str> {
        match &self.language {
            Some(LanguageLabel::Detected(code)) => Some(code.as_str()),
            _ => None,
        }
    }

    /// The detected language if it is one the system clusters.
    pub fn known_language(&self) -> Option<Language> {
        self.language_code().and_then(Language::from_code)
    }

    pub fn is_news(&self) -> bool {
        self.category.is_some_and(Category::is_news)
    }

    pub fn category_or_undefined(&self) -> Category {
        self.category.unwrap_or(Category::Undefined)
    }

    pub fn weight_or_zero(&self) -> f32 {
        self.weight.unwrap_or(0.0)
    }

    pub fn title(&self) -> &str {
        &self.article.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            ..Article::default()
        }
    }

    #[test]
    fn test_new_document_is_unclassified() {
        let doc = ClassifiedDocument::new("a.html", article("Title"), 42);
        assert!(!doc.classified);
        assert!(doc.language.is_none());
        assert!(!doc.is_news());
        assert_eq!(doc.category_or_undefined(), Category::Undefined);
        assert_eq!(doc.weight_or_zero(), 0.0);
    }

    #[test]
    fn test_known_language() {
        let mut doc = ClassifiedDocument::new("a.html", article("Title"), 42);
        doc.language = Some(LanguageLabel::Detected("en".to_string()));
        assert_eq!(doc.known_language(), Some(Language::En));

        doc.language = Some(LanguageLabel::Detected("de".to_string()));
        assert_eq!(doc.language_code(), Some("de"));
        assert_eq!(doc.known_language(), None);

        doc.language = Some(LanguageLabel::Undetermined);
        assert_eq!(doc.language_code(), None);
    }

    #[test]
    fn test_preprocessed_join() {
        let both = Preprocessed {
            title: "a b".to_string(),
            text: "c".to_string(),
        };
        assert_eq!(both.joined(), "a b c");
        assert_eq!(Preprocessed::default().joined(), "");
        assert!(Preprocessed::default().is_empty());
    }
}
