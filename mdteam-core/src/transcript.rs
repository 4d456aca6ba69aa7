//! SQLite-backed chat transcript store.
//!
//! Append-only message log keyed by conversation id. All access goes through
//! one connection behind a mutex and runs on the blocking thread pool, so
//! writes for a given conversation are serialized.

use crate::error::StoreError;
use crate::types::Role;
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id TEXT NOT NULL,
    role TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id);
";

/// Maximum title length (characters) shown in chat listings.
const TITLE_MAX_CHARS: usize = 50;

/// One stored transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub message: String,
    pub timestamp: String,
}

impl TranscriptEntry {
    /// The entry's role, if it is one the chat layer knows how to replay.
    pub fn chat_role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

/// Sidebar listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
}

/// Handle to the transcript database. Cheap to clone.
#[derive(Clone)]
pub struct TranscriptStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for TranscriptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptStore")
            .field("path", &self.path)
            .finish()
    }
}

impl TranscriptStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let open_err = |message: String| StoreError::Open {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| open_err(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| open_err(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| open_err(e.to_string()))?;
        debug!(path = %path.display(), "Transcript store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one message to a conversation.
    pub async fn append(&self, chat_id: &str, role: Role, message: &str) -> Result<(), StoreError> {
        let chat_id = chat_id.to_string();
        let message = message.to_string();
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO messages (chat_id, role, message, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, role.as_str(), message, created_at],
            )?;
            Ok(())
        })
        .await
    }

    /// All messages of a conversation, oldest first.
    pub async fn history(&self, chat_id: &str) -> Result<Vec<TranscriptEntry>, StoreError> {
        let chat_id = chat_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT role, message, created_at FROM messages WHERE chat_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![chat_id], |row| {
                Ok(TranscriptEntry {
                    role: row.get(0)?,
                    message: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Delete every message of a conversation; returns the number removed.
    pub async fn delete(&self, chat_id: &str) -> Result<usize, StoreError> {
        let chat_id = chat_id.to_string();
        self.with_conn(move |conn| {
            Ok(conn.execute("DELETE FROM messages WHERE chat_id = ?1", params![chat_id])?)
        })
        .await
    }

    /// Conversations, most recently active first, titled by their first user message.
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.chat_id, \
                        (SELECT f.message FROM messages f \
                         WHERE f.chat_id = m.chat_id AND f.role = 'user' \
                         ORDER BY f.id ASC LIMIT 1) AS first_user \
                 FROM messages m \
                 GROUP BY m.chat_id \
                 ORDER BY MAX(m.id) DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                let id: String = row.get(0)?;
                let first_user: Option<String> = row.get(1)?;
                Ok(ChatSummary {
                    id,
                    title: first_user
                        .map(|m| m.chars().take(TITLE_MAX_CHARS).collect())
                        .unwrap_or_else(|| "New Chat".to_string()),
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|e| StoreError::Query {
                message: format!("connection lock poisoned: {e}"),
            })?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::TaskJoin {
            message: e.to_string(),
        })?
    }
}
