//! Local chat persistence: a JSONL message log plus a metadata table.
//!
//! The layout mirrors the two stores the conversation needs: `chat.jsonl`
//! is the append-only message log (first line is a schema-version event),
//! and `metadata.json` holds named string values such as the backend thread
//! id. Every operation propagates its error to the caller; nothing is
//! dropped silently.

use crate::types::{Message, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current schema version written to new chat logs.
const SCHEMA_VERSION: u32 = 1;

/// Errors returned by the chat store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
}

/// Persistent store abstraction for the conversation and its metadata.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Append a message to the log and return the stored record.
    async fn append_message(&self, role: Role, content: &str) -> Result<Message, StoreError>;
    /// List all messages in insertion order.
    async fn list_messages(&self) -> Result<Vec<Message>, StoreError>;
    /// Set a metadata value by key, replacing any existing value.
    async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Read a metadata value by key.
    async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Delete all messages and metadata. Irreversible.
    async fn clear_all(&self) -> Result<(), StoreError>;
}

/// Internal JSONL event representation for the message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LogEvent {
    SchemaVersion {
        version: u32,
    },
    Message {
        role: String,
        content: String,
        created_at: DateTime<Utc>,
    },
}

/// JSONL-backed chat store rooted in a directory.
pub struct JsonlChatStore {
    /// Root directory holding `chat.jsonl` and `metadata.json`.
    root: PathBuf,
    /// Serialize write access to both files.
    write_lock: Mutex<()>,
}

impl JsonlChatStore {
    /// Create a new store under the given root, creating the directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized chat store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn log_path(&self) -> PathBuf {
        self.root.join("chat.jsonl")
    }

    fn meta_path(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    /// Append an event to the log, writing the schema header first when the
    /// file does not exist yet.
    fn write_event(&self, event: &LogEvent) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.log_path();
        let fresh = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if fresh {
            let header = serde_json::to_string(&LogEvent::SchemaVersion {
                version: SCHEMA_VERSION,
            })?;
            writeln!(file, "{header}")?;
        }
        let line = serde_json::to_string(event)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read and reconstruct the message log from disk.
    fn read_log(&self) -> Result<Vec<Message>, StoreError> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(&path)?;
        let reader = BufReader::new(file);
        let mut messages = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: LogEvent = serde_json::from_str(&line)?;
            match event {
                LogEvent::SchemaVersion { version } => {
                    if version > SCHEMA_VERSION {
                        return Err(StoreError::UnsupportedSchema(version));
                    }
                }
                LogEvent::Message {
                    role,
                    content,
                    created_at,
                } => messages.push(Message {
                    role: Role::parse(&role),
                    content,
                    created_at,
                }),
            }
        }
        Ok(messages)
    }

    fn read_meta_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let path = self.meta_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl ChatStore for JsonlChatStore {
    /// Append a message event to the log.
    async fn append_message(&self, role: Role, content: &str) -> Result<Message, StoreError> {
        debug!(
            "appending message (role={}, content_len={})",
            role.as_str(),
            content.len()
        );
        let message = Message::now(role, content);
        let event = LogEvent::Message {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            created_at: message.created_at,
        };
        self.write_event(&event)?;
        Ok(message)
    }

    /// Load the full message log from disk.
    async fn list_messages(&self) -> Result<Vec<Message>, StoreError> {
        self.read_log()
    }

    /// Rewrite the metadata file with the key set.
    async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_meta_map()?;
        map.insert(key.to_string(), value.to_string());
        debug!("setting metadata (key={})", key);
        fs::write(self.meta_path(), serde_json::to_string(&map)?)?;
        Ok(())
    }

    /// Read a metadata value from the metadata file.
    async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_meta_map()?.get(key).cloned())
    }

    /// Remove the message log and metadata files.
    async fn clear_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        info!("clearing chat store (root={})", self.root.display());
        for path in [self.log_path(), self.meta_path()] {
            if path.exists() {
                fs::remove_file(&path)?;
            } else {
                warn!("nothing to clear (path={})", path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatStore, JsonlChatStore, StoreError};
    use crate::types::Role;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn log_round_trips_across_reopen() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlChatStore::new(temp.path()).expect("store");

        let user = store
            .append_message(Role::User, "hello")
            .await
            .expect("append user");
        let assistant = store
            .append_message(Role::Assistant, "hi there")
            .await
            .expect("append assistant");
        store.set_meta("thread_id", "t-42").await.expect("set meta");

        let reopened = JsonlChatStore::new(temp.path()).expect("reopen");
        let listed = reopened.list_messages().await.expect("list");
        assert_eq!(listed, vec![user, assistant]);
        assert_eq!(
            reopened.get_meta("thread_id").await.expect("get meta"),
            Some("t-42".to_string())
        );
    }

    #[tokio::test]
    async fn clear_all_removes_messages_and_metadata() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlChatStore::new(temp.path()).expect("store");
        store
            .append_message(Role::User, "hello")
            .await
            .expect("append");
        store.set_meta("thread_id", "t-1").await.expect("set meta");

        store.clear_all().await.expect("clear");

        assert_eq!(store.list_messages().await.expect("list"), vec![]);
        assert_eq!(store.get_meta("thread_id").await.expect("get meta"), None);
    }

    #[tokio::test]
    async fn rejects_newer_schema_versions() {
        let temp = tempdir().expect("tempdir");
        let store = JsonlChatStore::new(temp.path()).expect("store");
        fs::write(
            temp.path().join("chat.jsonl"),
            "{\"type\":\"schema_version\",\"version\":99}\n",
        )
        .expect("write log");

        let result = store.list_messages().await;
        assert!(matches!(result, Err(StoreError::UnsupportedSchema(99))));
    }
}
