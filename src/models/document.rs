// file: src/models/document.rs
// description: stored document and change log record models
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A live document as held by the store and persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub name: String,
    pub content: String,
    pub expires_at: u64,
}

impl StoredDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>, expires_at: u64) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= now
    }

    /// Hex digest of the name, used as the snapshot file stem.
    pub fn name_hash(name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentState {
    Added,
    Changed,
    Removed,
}

/// Immutable snapshot of a document taken at the moment of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub document: StoredDocument,
    pub state: DocumentState,
    pub recorded_at: u64,
}

impl ChangeRecord {
    pub fn name(&self) -> &str {
        &self.document.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_inclusive() {
        let doc = StoredDocument::new("a.html", "<html/>", 100);
        assert!(!doc.is_expired(99));
        assert!(doc.is_expired(100));
    }

    #[test]
    fn test_name_hash_consistency() {
        let first = StoredDocument::name_hash("a.html");
        let second = StoredDocument::name_hash("a.html");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, StoredDocument::name_hash("b.html"));
    }
}
