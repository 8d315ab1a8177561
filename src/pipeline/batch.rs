// file: src/pipeline/batch.rs
// description: one-shot classification of a directory of html files
// reference: https://docs.rs/walkdir

use crate::classifier::{ClassifySettings, NewsModels, classify_document, prepare_document};
use crate::config::Config;
use crate::error::{NewsError, Result};
use crate::models::{ChangeRecord, ClassifiedDocument, DocumentState, StoredDocument};
use crate::parser::{HtmlExtractor, Tokenizer};
use futures::stream::{self, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Every `.html`/`.htm` file under `root`, sorted by path.
pub fn scan_html_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(NewsError::Config(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
                })
        })
        .collect();

    files.sort();
    info!("Found {} html files in {}", files.len(), root.display());
    Ok(files)
}

fn load_document(path: &Path, extractor: &HtmlExtractor) -> Result<ClassifiedDocument> {
    let bytes = fs::read(path).map_err(|source| NewsError::FileOperation {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let record = ChangeRecord {
        document: StoredDocument::new(name, content, u64::MAX),
        state: DocumentState::Added,
        recorded_at: modified,
    };
    prepare_document(extractor, &record)
}

/// Parses and classifies every html file under `root`.
///
/// Unreadable, malformed and failing files are logged and skipped.
pub async fn classify_directory(
    root: &Path,
    config: &Config,
    models: Arc<dyn NewsModels>,
) -> Result<Vec<ClassifiedDocument>> {
    let root = root.to_path_buf();
    let files = tokio::task::spawn_blocking(move || scan_html_files(&root)).await??;

    let tokenizer = Arc::new(Tokenizer::new());
    let settings = Arc::new(ClassifySettings {
        min_language_confidence: config.classifier.min_language_confidence,
        embedding_dim: config.clustering.embedding_dim,
    });
    let workers = config.pipeline.parallel_workers.max(1);

    let tasks = files.into_iter().map(|path| {
        let models = models.clone();
        let tokenizer = tokenizer.clone();
        let settings = settings.clone();

        async move {
            let shown = path.display().to_string();
            let outcome = tokio::task::spawn_blocking(move || {
                let mut doc = load_document(&path, &HtmlExtractor::new())?;
                classify_document(&mut doc, models.as_ref(), &tokenizer, &settings)?;
                Ok::<_, NewsError>(doc)
            })
            .await;

            match outcome {
                Ok(Ok(doc)) => {
                    debug!("Classified {}", shown);
                    Some(doc)
                }
                Ok(Err(e)) => {
                    warn!("Skipping {}: {}", shown, e);
                    None
                }
                Err(e) => {
                    warn!("Task for {} panicked: {}", shown, e);
                    None
                }
            }
        }
    });

    let mut documents: Vec<ClassifiedDocument> = stream::iter(tasks)
        .buffer_unordered(workers)
        .filter_map(|doc| async move { doc })
        .collect()
        .await;

    documents.sort_by(|a, b| a.name.cmp(&b.name));
    info!("Classified {} documents", documents.len());
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LexiconModels;
    use crate::models::{Category, Language};
    use tempfile::TempDir;

    fn page(title: &str, text: &str) -> String {
        format!(
            "<html><head><meta property=\"og:title\" content=\"{}\"/>\
             <meta property=\"article:published_time\" content=\"2020-05-01T12:00:00+03:00\"/></head>\
             <body><article><p>{}</p></article></body></html>",
            title, text
        )
    }

    #[test]
    fn test_scan_filters_extensions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.html"), "x").unwrap();
        fs::write(dir.path().join("a.htm"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = scan_html_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.htm", "b.html"]);
    }

    #[tokio::test]
    async fn test_classify_directory_with_lexicon_models() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("final.html"),
            page(
                "The cup final",
                "The coach said the match was the best of the league season.",
            ),
        )
        .unwrap();
        fs::write(
            dir.path().join("bank.html"),
            page(
                "Банк снизил ставку",
                "Центральный банк снизил ставку, рынок и акции выросли после решения.",
            ),
        )
        .unwrap();
        fs::write(dir.path().join("broken.html"), "<p>no document</p>").unwrap();

        let config = Config::default_config();
        let models = Arc::new(LexiconModels::new(
            &config.classifier,
            config.clustering.embedding_dim,
        ));

        let docs = classify_directory(dir.path(), &config, models).await.unwrap();
        assert_eq!(docs.len(), 2);

        let bank = &docs[0];
        assert_eq!(bank.name, "bank.html");
        assert_eq!(bank.known_language(), Some(Language::Ru));
        assert_eq!(bank.category, Some(Category::Economy));
        assert_eq!(bank.fetch_time, 1_588_323_600);

        let final_doc = &docs[1];
        assert_eq!(final_doc.known_language(), Some(Language::En));
        assert_eq!(final_doc.category, Some(Category::Sports));
        assert_eq!(final_doc.embedding.as_ref().map(Vec::len), Some(50));
    }
}
