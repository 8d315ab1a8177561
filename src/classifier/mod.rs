// file: src/classifier/mod.rs
// description: model contract and the per-document classification steps
// reference: internal module structure

pub mod lexicon;

pub use lexicon::LexiconModels;

use crate::error::Result;
use crate::models::{
    Category, ChangeRecord, ClassifiedDocument, Language, LanguageLabel, Preprocessed,
};
use crate::parser::{HtmlExtractor, Tokenizer};
use tracing::debug;

/// Characters of article text that feed language detection.
const LANGUAGE_SAMPLE_CHARS: usize = 100;

/// Language, category, authority and embedding models.
///
/// `Ok(None)` means the model has no answer for the input. `Err` is a
/// transient failure for that document only.
pub trait NewsModels: Send + Sync {
    fn detect_language(&self, text: &str) -> Result<Option<(String, f32)>>;

    fn classify(&self, language: Language, text: &str) -> Result<Option<String>>;

    fn embed(&self, language: Language, text: &str) -> Result<Option<Vec<f32>>>;

    fn score_authority(&self, url: &str) -> Result<Option<f32>>;
}

#[derive(Debug, Clone)]
pub struct ClassifySettings {
    pub min_language_confidence: f32,
    pub embedding_dim: usize,
}

/// Parses a change record's content into an unclassified document.
pub fn prepare_document(
    extractor: &HtmlExtractor,
    record: &ChangeRecord,
) -> Result<ClassifiedDocument> {
    let article = extractor.extract(record.name(), &record.document.content)?;
    let fetch_time = article.published_at.unwrap_or(record.recorded_at);
    Ok(ClassifiedDocument::new(record.name(), article, fetch_time))
}

/// Runs every classification step that has not produced a value yet.
///
/// On error the document keeps whatever steps already succeeded and stays
/// unclassified, so the next attempt resumes where this one stopped.
pub fn classify_document(
    doc: &mut ClassifiedDocument,
    models: &dyn NewsModels,
    tokenizer: &Tokenizer,
    settings: &ClassifySettings,
) -> Result<()> {
    if doc.language.is_none() {
        let sample = language_sample(doc);
        let label = match models.detect_language(&sample)? {
            Some((code, confidence)) if confidence >= settings.min_language_confidence => {
                LanguageLabel::Detected(code)
            }
            _ => LanguageLabel::Undetermined,
        };
        debug!("Language of {}: {:?}", doc.name, label);
        doc.language = Some(label);
    }

    if doc.preprocessed.is_none() {
        doc.preprocessed = Some(Preprocessed {
            title: tokenizer.preprocess(&doc.article.title),
            text: tokenizer.preprocess(&doc.article.text),
        });
    }

    let language = doc.known_language();
    let text = doc
        .preprocessed
        .as_ref()
        .map(Preprocessed::joined)
        .unwrap_or_default();

    if doc.category.is_none() {
        let category = match language {
            Some(language) if !text.is_empty() => models
                .classify(language, &text)?
                .and_then(|label| Category::from_label(&label))
                .unwrap_or(Category::Undefined),
            _ => Category::Undefined,
        };
        doc.category = Some(category);
    }

    if doc.weight.is_none() {
        let weight = models.score_authority(&doc.article.url)?;
        doc.weight = Some(weight.unwrap_or(0.0));
    }

    if doc.embedding.is_none()
        && doc.is_news()
        && let Some(language) = language
    {
        doc.embedding = match models.embed(language, &text)? {
            Some(vector) if vector.len() == settings.embedding_dim => Some(vector),
            Some(vector) => {
                debug!(
                    "Discarding embedding of {} with dimension {} (expected {})",
                    doc.name,
                    vector.len(),
                    settings.embedding_dim
                );
                None
            }
            None => None,
        };
    }

    doc.classified = true;
    Ok(())
}

fn language_sample(doc: &ClassifiedDocument) -> String {
    let head: String = doc.article.text.chars().take(LANGUAGE_SAMPLE_CHARS).collect();
    format!("{} {} {}", doc.article.title, doc.article.description, head)
}
