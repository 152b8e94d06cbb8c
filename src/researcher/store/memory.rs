// SPDX-License-Identifier: MIT

//! Key/value memory records with full-text search
//!
//! redb holds the records; a tantivy index derived from them ranks search
//! hits with BM25 and is rebuilt from the table whenever a store is opened.

use super::memory_index::MemoryIndex;
use crate::adk::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const MEMORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub key: String,
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryMatch {
    pub key: String,
    pub value: Value,
    pub score: f32,
}

/// Key/value store with similarity search over stored values
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn put(&self, key: &str, value: Value) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<MemoryRecord>>;
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryMatch>>;
    /// Returns whether the key existed
    async fn delete(&self, key: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct RedbMemoryStore {
    db: Arc<Database>,
    index: Arc<MemoryIndex>,
}

impl RedbMemoryStore {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MEMORY_TABLE)?;
        write_txn.commit()?;

        let store = Self {
            db,
            index: Arc::new(MemoryIndex::in_memory()?),
        };
        let indexed = store.rebuild_index()?;
        log::debug!("Indexed {} memory records", indexed);
        Ok(store)
    }

    /// Re-derive the search index from every stored record
    pub fn rebuild_index(&self) -> Result<usize> {
        let entries = self
            .all_records()?
            .into_iter()
            .map(|record| {
                let content = index_text(&record.value);
                (record.key, content)
            });
        self.index.rebuild(entries)
    }

    fn all_records(&self) -> Result<Vec<MemoryRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMORY_TABLE)?;

        let mut records: Vec<MemoryRecord> = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    fn read_record(&self, key: &str) -> Result<Option<MemoryRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMORY_TABLE)?;

        let record: Option<MemoryRecord> = match table.get(key)? {
            Some(data) => Some(serde_json::from_slice(data.value())?),
            None => None,
        };
        Ok(record)
    }
}

#[async_trait]
impl MemoryStore for RedbMemoryStore {
    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let content = index_text(&value);
        let record = MemoryRecord {
            key: key.to_string(),
            value,
            updated_at: Utc::now(),
        };
        let data = serde_json::to_vec(&record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            table.insert(key, data.as_slice())?;
        }
        write_txn.commit()?;

        self.index.upsert(key, &content)
    }

    async fn get(&self, key: &str) -> Result<Option<MemoryRecord>> {
        self.read_record(key)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryMatch>> {
        let hits = self.index.search(query, limit)?;

        let mut matches = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.read_record(&hit.key)? {
                Some(record) => matches.push(MemoryMatch {
                    key: record.key,
                    value: record.value,
                    score: hit.score,
                }),
                None => log::warn!("Index entry '{}' has no stored record", hit.key),
            }
        }
        Ok(matches)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;

        if existed {
            self.index.remove(key)?;
        }
        Ok(existed)
    }
}

/// Searchable text of a record: its string and number leaves, space separated
fn index_text(value: &Value) -> String {
    let mut text = String::new();
    collect_text(value, &mut text);
    text
}

fn collect_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push_str(s);
            out.push(' ');
        }
        Value::Number(n) => {
            out.push_str(&n.to_string());
            out.push(' ');
        }
        Value::Array(items) => items.iter().for_each(|v| collect_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_text(v, out)),
        Value::Bool(_) | Value::Null => {}
    }
}

/// Logging front-end over a [`MemoryStore`]; every call is forwarded as-is.
pub struct ResearchMemoryManager {
    store: Arc<dyn MemoryStore>,
}

impl ResearchMemoryManager {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    pub async fn save_memory(&self, key: &str, data: Value) -> Result<()> {
        log::info!("Saving memory for key: {}", key);
        self.store.put(key, data).await
    }

    pub async fn search_memory(&self, query: &str, top_k: usize) -> Result<Vec<MemoryMatch>> {
        log::info!("Searching memory for: {}", query);
        self.store.search(query, top_k).await
    }

    pub async fn get_memory(&self, key: &str) -> Result<Option<MemoryRecord>> {
        log::info!("Retrieving memory for key: {}", key);
        self.store.get(key).await
    }

    pub async fn delete_memory(&self, key: &str) -> Result<bool> {
        log::info!("Deleting memory for key: {}", key);
        self.store.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn manager(dir: &std::path::Path) -> ResearchMemoryManager {
        let db = Arc::new(Database::create(dir.join("memory.db")).unwrap());
        ResearchMemoryManager::new(Arc::new(RedbMemoryStore::new(db).unwrap()))
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let temp_dir = tempdir().unwrap();
        let memory = manager(temp_dir.path());

        let data = json!({"topic": "AI alignment", "summary": "Study on LLM safety mechanisms."});
        memory.save_memory("session-001", data.clone()).await.unwrap();

        let record = memory.get_memory("session-001").await.unwrap().unwrap();
        assert_eq!(record.key, "session-001");
        assert_eq!(record.value, data);

        assert!(memory.delete_memory("session-001").await.unwrap());
        assert!(memory.get_memory("session-001").await.unwrap().is_none());
        assert!(!memory.delete_memory("session-001").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let temp_dir = tempdir().unwrap();
        let memory = manager(temp_dir.path());

        memory.save_memory("k", json!({"v": 1})).await.unwrap();
        memory.save_memory("k", json!({"v": 2})).await.unwrap();

        let record = memory.get_memory("k").await.unwrap().unwrap();
        assert_eq!(record.value, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_search_ranks_by_relevance() {
        let temp_dir = tempdir().unwrap();
        let memory = manager(temp_dir.path());

        memory
            .save_memory("a", json!({"summary": "LLM safety evaluation"}))
            .await
            .unwrap();
        memory
            .save_memory("b", json!({"summary": "Safety of bridges"}))
            .await
            .unwrap();
        memory
            .save_memory("c", json!({"summary": "Protein folding"}))
            .await
            .unwrap();

        let results = memory.search_memory("LLM safety", 5).await.unwrap();
        let keys: Vec<&str> = results.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(results[0].score > results[1].score);
        assert!(results[1].score > 0.0);
    }

    #[tokio::test]
    async fn test_focused_record_outranks_passing_mention() {
        let temp_dir = tempdir().unwrap();
        let memory = manager(temp_dir.path());

        memory
            .save_memory(
                "a-passing",
                json!("A survey of transformers, vision models, diffusion, robotics, and one aside on qubits"),
            )
            .await
            .unwrap();
        memory
            .save_memory(
                "b-focused",
                json!({
                    "summary": "qubits qubits: superconducting qubits and qubit coherence",
                    "topic": "qubits"
                }),
            )
            .await
            .unwrap();
        memory
            .save_memory("c-plural", json!("Qubit decoherence"))
            .await
            .unwrap();

        let results = memory.search_memory("qubits", 5).await.unwrap();
        let keys: Vec<&str> = results.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["b-focused", "a-passing"]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_honours_limit() {
        let temp_dir = tempdir().unwrap();
        let memory = manager(temp_dir.path());

        for key in ["z", "m", "a"] {
            memory
                .save_memory(key, json!({"topic": "quantum"}))
                .await
                .unwrap();
        }

        assert_eq!(memory.search_memory("quantum", 2).await.unwrap().len(), 2);
        assert!(memory.search_memory("quantum", 0).await.unwrap().is_empty());
        assert!(memory.search_memory("  ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_tracks_overwrite_and_delete() {
        let temp_dir = tempdir().unwrap();
        let memory = manager(temp_dir.path());

        memory
            .save_memory("k", json!({"topic": "surface codes"}))
            .await
            .unwrap();
        memory
            .save_memory("k", json!({"topic": "protein folding"}))
            .await
            .unwrap();

        assert!(memory.search_memory("surface", 5).await.unwrap().is_empty());
        let results = memory.search_memory("protein", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, json!({"topic": "protein folding"}));

        memory.delete_memory("k").await.unwrap();
        assert!(memory.search_memory("protein", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_index_rebuilt_on_reopen() {
        let temp_dir = tempdir().unwrap();
        let db = Arc::new(Database::create(temp_dir.path().join("memory.db")).unwrap());

        let first = RedbMemoryStore::new(db.clone()).unwrap();
        first
            .put("kept", json!({"topic": "topological qubits"}))
            .await
            .unwrap();

        let reopened = RedbMemoryStore::new(db).unwrap();
        let results = reopened.search("topological", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "kept");
    }

    #[test]
    fn test_index_text_walks_leaves() {
        let value = json!({"topic": "qec", "year": 2024, "tags": ["surface", true], "x": null});
        let text = index_text(&value);
        for word in ["qec", "2024", "surface"] {
            assert!(text.contains(word), "missing {}", word);
        }
        assert!(!text.contains("true"));
    }
}
