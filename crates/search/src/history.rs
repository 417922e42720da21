//! Bounded, ordered log of past searches.
//!
//! Newest entries are at the back. Pushing past capacity evicts the oldest.

use crate::error::SearchError;
use crate::types::SearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub result: SearchResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHistory {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl SearchHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, result: SearchResult) {
        self.entries.push_back(HistoryEntry {
            timestamp: Utc::now(),
            result,
        });
        self.enforce_capacity();
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Removes one entry; later entries shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Loads from JSON; a missing file yields an empty history. The given
    /// capacity replaces the stored one.
    pub fn load(path: &Path, capacity: usize) -> Result<Self, SearchError> {
        if !path.exists() {
            return Ok(Self::new(capacity));
        }

        let content = std::fs::read_to_string(path)?;
        let mut history: Self = serde_json::from_str(&content)?;
        history.capacity = capacity.max(1);
        history.enforce_capacity();
        debug!("Loaded {} history entries from {}", history.len(), path.display());
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> Result<(), SearchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn enforce_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntityRef;
    use tempfile::TempDir;

    fn texts(h: &SearchHistory) -> Vec<String> {
        h.iter().map(|e| e.result.search_text.clone()).collect()
    }

    #[test]
    fn oldest_entry_is_evicted() {
        let mut h = SearchHistory::new(2);
        h.push(SearchResult::new("aaa"));
        h.push(SearchResult::new("bbb"));
        h.push(SearchResult::new("ccc"));
        assert_eq!(texts(&h), vec!["bbb", "ccc"]);
        assert_eq!(h.latest().map(|e| e.result.search_text.as_str()), Some("ccc"));
    }

    #[test]
    fn remove_by_index_shifts_later_entries() {
        let mut h = SearchHistory::new(10);
        for t in ["aaa", "bbb", "ccc", "ddd"] {
            h.push(SearchResult::new(t));
        }
        assert_eq!(h.remove(1).map(|e| e.result.search_text), Some("bbb".to_string()));
        assert_eq!(texts(&h), vec!["aaa", "ccc", "ddd"]);
        assert!(h.remove(3).is_none());
    }

    #[test]
    fn save_and_load_respects_new_capacity() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/history.json");

        let mut h = SearchHistory::new(5);
        let mut r = SearchResult::new("guid-1");
        r.matched_entities.push(EntityRef::new("g", "Assets/a.prefab"));
        h.push(r);
        h.push(SearchResult::new("guid-2"));
        h.save(&path).unwrap();

        let loaded = SearchHistory::load(&path, 1).unwrap();
        assert_eq!(loaded.capacity(), 1);
        assert_eq!(texts(&loaded), vec!["guid-2"]);

        let missing = SearchHistory::load(&tmp.path().join("none.json"), 3).unwrap();
        assert!(missing.is_empty());
    }
}
