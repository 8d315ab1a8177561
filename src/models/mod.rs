// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod article;
pub mod category;
pub mod document;
pub mod thread;

pub use article::{Article, ClassifiedDocument, LanguageLabel, Preprocessed};
pub use category::{Category, Language};
pub use document::{ChangeRecord, DocumentState, StoredDocument};
pub use thread::{ThreadEntry, ThreadsResponse};
