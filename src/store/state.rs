// file: src/store/state.rs
// description: live document map, expiration index and change log

use crate::error::{NewsError, Result};
use crate::models::{ChangeRecord, DocumentState, StoredDocument};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Owned exclusively by the store actor.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    documents: HashMap<String, StoredDocument>,
    by_expiry: BTreeSet<(u64, String)>,
    change_log: Vec<ChangeRecord>,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document. Returns true when it replaced one.
    pub fn put(&mut self, document: StoredDocument, now: u64) -> bool {
        let name = document.name.clone();
        let expires_at = document.expires_at;

        let previous = self.documents.insert(name.clone(), document.clone());
        if let Some(previous) = &previous {
            self.by_expiry.remove(&(previous.expires_at, name.clone()));
        }
        self.by_expiry.insert((expires_at, name.clone()));

        let is_update = previous.is_some();
        let state = if is_update {
            DocumentState::Changed
        } else {
            DocumentState::Added
        };
        debug!("Stored {} ({:?}, expires at {})", name, state, expires_at);
        self.record(document, state, now);
        self.debug_check();

        is_update
    }

    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    pub fn remove(&mut self, name: &str, now: u64) -> Option<StoredDocument> {
        let document = self.documents.remove(name)?;
        self.by_expiry.remove(&(document.expires_at, name.to_string()));
        debug!("Removed {}", name);
        self.record(document.clone(), DocumentState::Removed, now);
        self.debug_check();
        Some(document)
    }

    /// Removes every document with `expires_at <= now`, oldest first.
    /// Names for which `is_busy` holds are left for a later sweep.
    pub fn expire(&mut self, now: u64, is_busy: impl Fn(&str) -> bool) -> Vec<String> {
        let due: Vec<(u64, String)> = self
            .by_expiry
            .iter()
            .take_while(|(expires_at, _)| *expires_at <= now)
            .filter(|(_, name)| !is_busy(name))
            .cloned()
            .collect();

        let mut expired = Vec::with_capacity(due.len());
        for key in due {
            self.by_expiry.remove(&key);
            let (_, name) = key;
            if let Some(document) = self.documents.remove(&name) {
                self.record(document, DocumentState::Removed, now);
                expired.push(name);
            }
        }

        if !expired.is_empty() {
            debug!("Expired {} documents", expired.len());
        }
        self.debug_check();
        expired
    }

    /// Loads a persisted document; logged as Added so consumers pick it up.
    pub fn restore(&mut self, document: StoredDocument, now: u64) {
        if let Some(previous) = self.documents.remove(&document.name) {
            self.by_expiry
                .remove(&(previous.expires_at, previous.name.clone()));
        }
        self.by_expiry
            .insert((document.expires_at, document.name.clone()));
        self.documents
            .insert(document.name.clone(), document.clone());
        self.record(document, DocumentState::Added, now);
        self.debug_check();
    }

    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.change_log)
    }

    pub fn is_alive(&self, name: &str, now: u64) -> Result<bool> {
        self.documents
            .get(name)
            .map(|document| !document.is_expired(now))
            .ok_or_else(|| NewsError::NotFound(name.to_string()))
    }

    pub fn documents(&self) -> Vec<StoredDocument> {
        self.documents.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    fn record(&mut self, document: StoredDocument, state: DocumentState, now: u64) {
        self.change_log.push(ChangeRecord {
            document,
            state,
            recorded_at: now,
        });
    }

    fn debug_check(&self) {
        debug_assert_eq!(
            self.documents.len(),
            self.by_expiry.len(),
            "expiration index out of sync with document map"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(name: &str, content: &str, expires_at: u64) -> StoredDocument {
        StoredDocument::new(name, content, expires_at)
    }

    fn idle(_: &str) -> bool {
        false
    }

    fn states(records: &[ChangeRecord]) -> Vec<(&str, DocumentState)> {
        records.iter().map(|r| (r.name(), r.state)).collect()
    }

    #[test]
    fn test_put_then_update() {
        let mut state = StoreState::new();

        assert!(!state.put(doc("a.html", "v1", 1060), 1000));
        assert!(state.put(doc("a.html", "v2", 1040), 1010));
        assert_eq!(state.len(), 1);
        assert_eq!(state.documents(), vec![doc("a.html", "v2", 1040)]);

        let log = state.drain();
        assert_eq!(
            states(&log),
            vec![("a.html", DocumentState::Added), ("a.html", DocumentState::Changed)]
        );
        assert_eq!(log[1].recorded_at, 1010);
    }

    #[test]
    fn test_update_moves_expiry() {
        let mut state = StoreState::new();
        state.put(doc("a.html", "v1", 10), 0);
        state.put(doc("a.html", "v2", 105), 5);

        assert!(state.expire(50, idle).is_empty());
        assert_eq!(state.expire(105, idle), vec!["a.html".to_string()]);
    }

    #[test]
    fn test_expire_is_idempotent() {
        let mut state = StoreState::new();
        state.put(doc("a.html", "a", 10), 0);
        state.put(doc("b.html", "b", 20), 0);
        state.put(doc("c.html", "c", 30), 0);
        state.drain();

        let expired = state.expire(20, idle);
        assert_eq!(expired, vec!["a.html".to_string(), "b.html".to_string()]);
        assert!(state.expire(20, idle).is_empty());

        let log = state.drain();
        assert_eq!(
            states(&log),
            vec![("a.html", DocumentState::Removed), ("b.html", DocumentState::Removed)]
        );
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_drain_twice() {
        let mut state = StoreState::new();
        state.put(doc("a.html", "a", 10), 0);
        state.remove("a.html", 1);
        assert!(state.remove("a.html", 2).is_none());

        assert_eq!(state.drain().len(), 2);
        assert!(state.drain().is_empty());
    }

    #[test]
    fn test_is_alive() {
        let mut state = StoreState::new();
        state.put(doc("a.html", "a", 1060), 1000);

        assert!(state.is_alive("a.html", 1059).unwrap());
        assert!(!state.is_alive("a.html", 1060).unwrap());
        assert!(matches!(
            state.is_alive("b.html", 1000),
            Err(NewsError::NotFound(_))
        ));

        state.expire(1060, idle);
        assert!(state.is_alive("a.html", 1060).is_err());
    }

    #[test]
    fn test_expire_skips_busy_names() {
        let mut state = StoreState::new();
        state.put(doc("a.html", "a", 10), 0);
        state.put(doc("b.html", "b", 10), 0);

        let expired = state.expire(10, |name| name == "a.html");
        assert_eq!(expired, vec!["b.html".to_string()]);
        assert!(state.contains("a.html"));
        assert_eq!(state.expire(10, idle), vec!["a.html".to_string()]);
    }

    #[test]
    fn test_restore_logs_added() {
        let mut state = StoreState::new();
        state.restore(StoredDocument::new("a.html", "a", 500), 100);

        assert!(state.is_alive("a.html", 100).unwrap());
        assert_eq!(states(&state.drain()), vec![("a.html", DocumentState::Added)]);
    }
}
