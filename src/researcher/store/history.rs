// SPDX-License-Identifier: MIT

//! Append-only chat history keyed by session id

use crate::adk::error::{ResearchError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const CHAT_HISTORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chat_history");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Human => "human",
            Role::Ai => "ai",
            Role::System => "system",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Persistent, ordered message log for one session
#[async_trait]
pub trait ChatHistory: Send + Sync {
    /// All stored messages, oldest first
    async fn messages(&self) -> Result<Vec<StoredMessage>>;

    /// Append a message to the end of the log
    async fn add_message(&self, message: StoredMessage) -> Result<()>;
}

/// redb-backed history. Keys are `{session}:{seq:020}` so a prefix range
/// scan yields the session's messages in insertion order.
#[derive(Debug, Clone)]
pub struct RedbChatHistory {
    db: Arc<Database>,
    session_id: String,
}

impl RedbChatHistory {
    pub fn new(db: Arc<Database>, session_id: impl Into<String>) -> Result<Self> {
        let session_id = session_id.into();
        if session_id.is_empty() || session_id.contains(':') {
            return Err(ResearchError::config(format!(
                "Invalid session id '{}': must be non-empty and contain no ':'",
                session_id
            )));
        }

        let write_txn = db.begin_write()?;
        write_txn.open_table(CHAT_HISTORY_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn prefix_range(&self) -> (String, String) {
        // ';' is the byte after ':'
        (
            format!("{}:", self.session_id),
            format!("{};", self.session_id),
        )
    }
}

fn parse_seq(key: &str) -> Result<u64> {
    key.rsplit(':')
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| ResearchError::other(format!("Malformed history key: {}", key)))
}

#[async_trait]
impl ChatHistory for RedbChatHistory {
    async fn messages(&self) -> Result<Vec<StoredMessage>> {
        let (start, end) = self.prefix_range();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAT_HISTORY_TABLE)?;

        let mut messages: Vec<StoredMessage> = Vec::new();
        for item in table.range(start.as_str()..end.as_str())? {
            let (_, value) = item?;
            messages.push(serde_json::from_slice(value.value())?);
        }

        log::debug!(
            "Loaded {} messages for session {}",
            messages.len(),
            self.session_id
        );
        Ok(messages)
    }

    async fn add_message(&self, message: StoredMessage) -> Result<()> {
        let (start, end) = self.prefix_range();
        let data = serde_json::to_vec(&message)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHAT_HISTORY_TABLE)?;
            let last_key = table
                .range(start.as_str()..end.as_str())?
                .next_back()
                .transpose()?
                .map(|(key, _)| key.value().to_string());
            let next_seq = match last_key {
                Some(key) => parse_seq(&key)? + 1,
                None => 0,
            };
            let key = format!("{}{:020}", start, next_seq);
            table.insert(key.as_str(), data.as_slice())?;
            log::debug!("Appended {} message as {}", message.role, key);
        }
        write_txn.commit()?;
        Ok(())
    }
}
