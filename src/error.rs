// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NewsError>;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Malformed input in {name}: {message}")]
    MalformedInput { name: String, message: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Classification failed for {name}: {message}")]
    Classification { name: String, message: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Document store is no longer running")]
    StoreClosed,

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NewsError {
    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's query rather than by the service.
    pub fn is_bad_query(&self) -> bool {
        matches!(self, Self::UnknownCategory(_) | Self::UnknownLanguage(_))
    }
}

impl From<tokio::task::JoinError> for NewsError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_query_classification() {
        assert!(NewsError::UnknownCategory("weather".to_string()).is_bad_query());
        assert!(NewsError::UnknownLanguage("de".to_string()).is_bad_query());
        assert!(!NewsError::NotFound("a.html".to_string()).is_bad_query());
    }

    #[test]
    fn test_malformed_message() {
        let err = NewsError::malformed("a.html", "no article");
        assert_eq!(err.to_string(), "Malformed input in a.html: no article");
    }
}
