// SPDX-License-Identifier: MIT

//! Persistent storage on a single redb database file
//!
//! - `history` - append-only chat log keyed by session id
//! - `memory` - key/value research records with similarity search
//! - `memory_index` - tantivy BM25 index derived from the memory records

mod history;
mod memory;
mod memory_index;

pub use history::{ChatHistory, RedbChatHistory, Role, StoredMessage};
pub use memory::{
    MemoryMatch, MemoryRecord, MemoryStore, RedbMemoryStore, ResearchMemoryManager,
    DEFAULT_SEARCH_LIMIT,
};

use crate::adk::error::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

/// Open the database, creating the file and its parent directories if needed
pub fn open_database(path: &Path) -> Result<Arc<Database>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    log::info!("Opening database at {}", path.display());
    Ok(Arc::new(Database::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_history_and_memory_share_database() {
        let temp_dir = tempdir().unwrap();
        let db = open_database(&temp_dir.path().join("nested/dir/research.redb")).unwrap();

        let history = RedbChatHistory::new(db.clone(), "s").unwrap();
        let memory = RedbMemoryStore::new(db).unwrap();

        history
            .add_message(StoredMessage::new(Role::Ai, "report"))
            .await
            .unwrap();
        memory
            .put("k", serde_json::json!({"topic": "report"}))
            .await
            .unwrap();

        assert_eq!(history.messages().await.unwrap().len(), 1);
        assert!(memory.get("k").await.unwrap().is_some());
    }
}
