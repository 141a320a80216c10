// src/dedup.rs
//
// Bounded, persisted record of already-processed comment ids. The engine is
// the only reader/writer, so no interior locking is needed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
struct SeenBlob {
    saved_at: DateTime<Utc>,
    ids: Vec<String>,
}

/// Ordered set of recently processed comment ids, most-recent-last.
/// Insertion appends and prunes from the front, so eviction order is
/// arrival order. The whole sequence round-trips through a JSON blob.
#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    capacity: usize,
    ids: Vec<String>,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
            ids: Vec::new(),
        }
    }

    /// Read prior state from disk. Returns true iff a blob was found and
    /// parsed. A missing or corrupt file starts the store empty with a
    /// warning; it never fails the caller.
    pub fn load(&mut self) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "no dedup state found, starting empty");
                return false;
            }
        };
        match serde_json::from_str::<SeenBlob>(&content) {
            Ok(blob) => {
                self.ids = blob.ids;
                self.prune();
                tracing::info!(
                    path = %self.path.display(),
                    count = self.ids.len(),
                    saved_at = %blob.saved_at,
                    "loaded dedup state"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt dedup state, starting empty"
                );
                self.ids.clear();
                false
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    pub fn record(&mut self, id: String) {
        self.ids.push(id);
        self.prune();
    }

    fn prune(&mut self) {
        if self.ids.len() > self.capacity {
            let excess = self.ids.len() - self.capacity;
            self.ids.drain(0..excess);
        }
    }

    /// Write the current sequence to disk. Called exactly once on every
    /// exit path of the engine loop.
    pub fn persist(&self) -> Result<()> {
        let blob = SeenBlob {
            saved_at: Utc::now(),
            ids: self.ids.clone(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&blob).context("serializing dedup state")?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing dedup state to {}", self.path.display()))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_after_record() {
        let mut s = SeenStore::new("unused", 10);
        assert!(!s.contains("abc"));
        s.record("abc".to_string());
        assert!(s.contains("abc"));
    }

    #[test]
    fn oldest_id_evicted_past_capacity() {
        let mut s = SeenStore::new("unused", 3);
        for i in 0..4 {
            s.record(format!("id{i}"));
        }
        assert!(!s.contains("id0"));
        assert!(s.contains("id1"));
        assert!(s.contains("id3"));
        assert_eq!(s.ids(), &["id1", "id2", "id3"]);
    }

    #[test]
    fn eviction_is_arrival_order_not_content_order() {
        let mut s = SeenStore::new("unused", 2);
        s.record("zzz".to_string());
        s.record("aaa".to_string());
        s.record("mmm".to_string());
        // "zzz" arrived first, so it goes first despite sorting last.
        assert_eq!(s.ids(), &["aaa", "mmm"]);
    }

    #[test]
    fn persist_then_load_round_trips_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");

        let mut s = SeenStore::new(&path, 10);
        s.record("first".to_string());
        s.record("second".to_string());
        s.record("third".to_string());
        s.persist().unwrap();

        let mut reloaded = SeenStore::new(&path, 10);
        assert!(reloaded.load());
        assert_eq!(reloaded.ids(), &["first", "second", "third"]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = SeenStore::new(dir.path().join("nope"), 10);
        assert!(!s.load());
        assert!(!s.contains("anything"));
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        fs::write(&path, "{ this is not json").unwrap();

        let mut s = SeenStore::new(&path, 10);
        assert!(!s.load());
        assert!(s.ids().is_empty());

        // Recovery path still round-trips afterwards.
        s.record("x".to_string());
        s.persist().unwrap();
        let mut again = SeenStore::new(&path, 10);
        assert!(again.load());
        assert_eq!(again.ids(), &["x"]);
    }

    #[test]
    fn load_prunes_oversized_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");

        let mut big = SeenStore::new(&path, 10);
        for i in 0..10 {
            big.record(format!("id{i}"));
        }
        big.persist().unwrap();

        // A smaller capacity keeps only the most recent ids.
        let mut small = SeenStore::new(&path, 4);
        assert!(small.load());
        assert_eq!(small.ids(), &["id6", "id7", "id8", "id9"]);
    }
}
