// file: src/models/category.rs
// description: topic category and language enums with query slot mapping
// reference: internal data structures

use crate::error::{NewsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic category of a document or thread.
///
/// Declaration order is the tie-break order for category votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NotNews,
    Undefined,
    Any,
    Society,
    Economy,
    Technology,
    Sports,
    Entertainment,
    Science,
    Other,
}

impl Category {
    /// Categories that own a column in the answer table, in slot order.
    pub const SLOTS: [Category; 8] = [
        Category::Any,
        Category::Society,
        Category::Economy,
        Category::Technology,
        Category::Sports,
        Category::Entertainment,
        Category::Science,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::NotNews => "not_news",
            Category::Undefined => "undefined",
            Category::Any => "any",
            Category::Society => "society",
            Category::Economy => "economy",
            Category::Technology => "technology",
            Category::Sports => "sports",
            Category::Entertainment => "entertainment",
            Category::Science => "science",
            Category::Other => "other",
        }
    }

    /// Parses a classifier label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let category = match label.trim().to_ascii_lowercase().as_str() {
            "not_news" => Category::NotNews,
            "undefined" => Category::Undefined,
            "any" => Category::Any,
            "society" => Category::Society,
            "economy" => Category::Economy,
            "technology" => Category::Technology,
            "sports" => Category::Sports,
            "entertainment" => Category::Entertainment,
            "science" => Category::Science,
            "other" => Category::Other,
            _ => return None,
        };
        Some(category)
    }

    /// Parses a query parameter; only categories with a slot are accepted.
    pub fn from_query(value: &str) -> Result<Self> {
        Self::from_label(value)
            .filter(|category| category.slot().is_some())
            .ok_or_else(|| NewsError::UnknownCategory(value.to_string()))
    }

    pub fn slot(self) -> Option<usize> {
        Self::SLOTS.iter().position(|c| *c == self)
    }

    pub fn is_news(self) -> bool {
        self != Category::NotNews
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Languages that take part in clustering and answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Ru, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ru" => Some(Language::Ru),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn from_query(code: &str) -> Result<Self> {
        Self::from_code(code).ok_or_else(|| NewsError::UnknownLanguage(code.to_string()))
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_cover_queryable_categories() {
        assert_eq!(Category::Any.slot(), Some(0));
        assert_eq!(Category::Other.slot(), Some(7));
        assert_eq!(Category::Undefined.slot(), None);
        assert_eq!(Category::NotNews.slot(), None);
    }

    #[test]
    fn test_query_parsing() {
        assert_eq!(Category::from_query("sports").unwrap(), Category::Sports);
        assert!(Category::from_query("undefined").is_err());
        assert!(Category::from_query("weather").is_err());
        assert_eq!(Language::from_query("EN").unwrap(), Language::En);
        assert!(matches!(
            Language::from_query("de"),
            Err(NewsError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_label_round_trip_names() {
        for category in Category::SLOTS {
            assert_eq!(Category::from_label(category.name()), Some(category));
        }
        assert_eq!(Category::from_label("not_news"), Some(Category::NotNews));
    }

    #[test]
    fn test_ordinal_order() {
        assert!(Category::Any < Category::Society);
        assert!(Category::Sports < Category::Other);
        assert_eq!(Language::Ru.index(), 0);
        assert_eq!(Language::En.index(), 1);
    }
}
