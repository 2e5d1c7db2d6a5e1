//! In-memory session aggregate store.
//!
//! One `CaseRecord` per session key. Every mutation runs as a closure under
//! the write lock, so concurrent uploads for the same key serialize their
//! read-modify-write and the merge policy's fill-only-unset invariant holds.
//! The abstraction is deliberately narrow (get/update/delete by key) so a
//! persistent backend can replace it without touching the pipeline.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::record::CaseRecord;

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, CaseRecord>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_key() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Snapshot of the record for a key.
    pub fn get(&self, key: &str) -> Option<CaseRecord> {
        self.inner.read().unwrap().get(key).cloned()
    }

    /// Read-modify-write under the write lock, creating the record on first
    /// upload. Returns the resulting snapshot.
    pub fn update<F>(&self, key: &str, mutate: F) -> CaseRecord
    where
        F: FnOnce(&mut CaseRecord),
    {
        let mut store = self.inner.write().unwrap();
        let record = store.entry(key.to_string()).or_default();
        mutate(record);
        record.clone()
    }

    /// Explicit deletion; returns false when the key was absent.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.write().unwrap().remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PassportRecord;

    #[test]
    fn update_creates_then_mutates_in_place() {
        let store = SessionStore::new();
        assert!(store.get("case1").is_none());

        let snapshot = store.update("case1", |case| {
            case.passport = Some(PassportRecord {
                last_name: Some("Silva".to_string()),
                ..Default::default()
            });
        });
        assert!(snapshot.passport.is_some());

        let snapshot = store.update("case1", |case| {
            case.representative = Some(Default::default());
        });
        // Earlier sub-record survives the second upload.
        assert_eq!(
            snapshot.passport.unwrap().last_name.as_deref(),
            Some("Silva")
        );
        assert!(snapshot.representative.is_some());
    }

    #[test]
    fn keys_are_independent() {
        let store = SessionStore::new();
        store.update("a", |case| case.passport = Some(Default::default()));
        assert!(store.get("b").is_none());
        assert!(store.get("a").is_some());
    }

    #[test]
    fn delete_reports_absence() {
        let store = SessionStore::new();
        store.update("a", |_| {});
        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.get("a").is_none());
    }

    #[test]
    fn generated_keys_are_unique() {
        assert_ne!(SessionStore::new_key(), SessionStore::new_key());
    }
}
