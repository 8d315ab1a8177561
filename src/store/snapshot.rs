// file: src/store/snapshot.rs
// description: one json file per live document in the content directory
// reference: https://docs.rs/walkdir

use crate::error::{NewsError, Result};
use crate::models::StoredDocument;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Documents read back from disk plus what was thrown away on the way.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    pub documents: Vec<StoredDocument>,
    pub expired: usize,
    pub corrupt: usize,
}

/// Blocking filesystem access. Call from the blocking pool only.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| NewsError::FileOperation {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.json", StoredDocument::name_hash(name)))
    }

    /// Writes through a temporary file so a crash never leaves a torn snapshot.
    pub fn write(&self, document: &StoredDocument) -> Result<()> {
        let path = self.path_for(&document.name);
        let tmp = path.with_extension("json.tmp");
        let payload = serde_json::to_vec(document)?;

        let write_tmp = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&payload)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };

        write_tmp().map_err(|source| NewsError::FileOperation {
            path: path.clone(),
            source,
        })?;

        debug!("Persisted {} to {}", document.name, path.display());
        Ok(())
    }

    /// Returns false when there was nothing to remove.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Deleted snapshot of {}", name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(NewsError::FileOperation { path, source }),
        }
    }

    /// Loads every snapshot; expired and unreadable ones are deleted.
    pub fn restore(&self, now: u64) -> Result<RestoreOutcome> {
        let mut outcome = RestoreOutcome::default();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let is_snapshot = path.extension().is_some_and(|ext| ext == "json");
            let is_leftover = path.extension().is_some_and(|ext| ext == "tmp");

            if is_leftover {
                self.discard(path);
                continue;
            }
            if !is_snapshot {
                continue;
            }

            let parsed = fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    serde_json::from_slice::<StoredDocument>(&bytes).map_err(|e| e.to_string())
                });

            match parsed {
                Ok(document) if document.is_expired(now) => {
                    debug!("Dropping expired snapshot of {}", document.name);
                    self.discard(path);
                    outcome.expired += 1;
                }
                Ok(document) => outcome.documents.push(document),
                Err(e) => {
                    warn!("Deleting unreadable snapshot {}: {}", path.display(), e);
                    self.discard(path);
                    outcome.corrupt += 1;
                }
            }
        }

        info!(
            "Restored {} documents from {} ({} expired, {} corrupt)",
            outcome.documents.len(),
            self.root.display(),
            outcome.expired,
            outcome.corrupt
        );

        Ok(outcome)
    }

    fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to delete {}: {}", path.display(), e);
        }
    }
}
