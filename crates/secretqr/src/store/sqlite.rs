//! Local `SQLite` message store.
//!
//! [`Storage`] is the synchronous database layer; [`SqliteStore`] wraps it in a
//! mutex and exposes it through the async [`MessageStore`] trait.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{migrations, MessageStore};
use crate::error::{Error, Result};
use crate::message::{Message, MessageId};

/// Synchronous `SQLite` storage for messages and config entries.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a new message under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_message(&self, content: &str) -> Result<Message> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        self.conn.execute(
            "INSERT INTO messages (id, content, created_at) VALUES (?1, ?2, ?3)",
            params![id, content, created_at.to_rfc3339()],
        )?;

        debug!(id = %id, len = content.len(), "Inserted message");
        Ok(Message {
            id: MessageId::parse(&id)
                .ok_or_else(|| Error::internal("generated an empty message id"))?,
            content: content.to_string(),
            created_at: Some(created_at),
        })
    }

    /// Get a message by its exact id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_message(&self, id: &MessageId) -> Result<Option<Message>> {
        let message = self
            .conn
            .query_row(
                "SELECT id, content, created_at FROM messages WHERE id = ?1",
                [id.as_str()],
                Self::row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    /// Get a config value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a config value.
    ///
    /// Only administrative tooling writes config; the Send and Get flows
    /// treat the table as read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        info!(key, "Config entry updated");
        Ok(())
    }

    /// Count stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_messages = self.count()?;

        let (oldest, newest): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM messages",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_messages,
            oldest_message: oldest.as_deref().and_then(parse_timestamp),
            newest_message: newest.as_deref().and_then(parse_timestamp),
            db_size_bytes,
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
        let id: String = row.get(0)?;
        let content: String = row.get(1)?;
        let created_at: String = row.get(2)?;

        let created_at = parse_timestamp(&created_at);
        if created_at.is_none() {
            warn!(id = %id, "Message has an unreadable created_at timestamp");
        }

        Ok(Message {
            id: MessageId::parse(&id).ok_or(rusqlite::Error::InvalidColumnType(
                0,
                "id".to_string(),
                rusqlite::types::Type::Text,
            ))?,
            content,
            created_at,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Statistics about the local store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageStats {
    /// Total number of messages stored.
    pub total_messages: i64,
    /// When the oldest message was stored.
    pub oldest_message: Option<DateTime<Utc>>,
    /// When the newest message was stored.
    pub newest_message: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// [`MessageStore`] backed by a local [`Storage`].
#[derive(Debug)]
pub struct SqliteStore {
    storage: Mutex<Storage>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Storage::open(path)?))
    }

    /// Create a store on an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?))
    }

    /// Wrap an already opened [`Storage`].
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }

    /// Lock the underlying storage for direct (administrative) access.
    ///
    /// # Errors
    ///
    /// Returns an error if a previous holder of the lock panicked.
    pub fn storage(&self) -> Result<MutexGuard<'_, Storage>> {
        self.storage
            .lock()
            .map_err(|_| Error::internal("message store lock poisoned"))
    }
}

#[async_trait]
impl MessageStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn insert_message(&self, content: &str) -> Result<Message> {
        self.storage()?.insert_message(content)
    }

    async fn find_message(&self, id: &MessageId) -> Result<Option<Message>> {
        self.storage()?.get_message(id)
    }

    async fn find_config(&self, key: &str) -> Result<Option<String>> {
        self.storage()?.get_config(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn temp_db_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("secretqr_{tag}_{}.db", std::process::id()))
    }

    fn remove_db(path: &Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_insert_and_get() {
        let storage = create_test_storage();

        let stored = storage.insert_message("meet at 7pm").unwrap();
        assert!(stored.created_at.is_some());

        let retrieved = storage.get_message(&stored.id).unwrap().unwrap();
        assert_eq!(retrieved.content, "meet at 7pm");
        assert_eq!(retrieved.id, stored.id);
    }

    #[test]
    fn test_insert_generates_distinct_ids() {
        let storage = create_test_storage();

        let first = storage.insert_message("same").unwrap();
        let second = storage.insert_message("same").unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(storage.count().unwrap(), 2);
    }

    #[test]
    fn test_generated_id_is_uuid() {
        let storage = create_test_storage();
        let stored = storage.insert_message("x").unwrap();
        assert!(Uuid::parse_str(stored.id.as_str()).is_ok());
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = create_test_storage();
        let id = MessageId::parse("never-issued").unwrap();
        assert!(storage.get_message(&id).unwrap().is_none());
    }

    #[test]
    fn test_whitespace_and_newlines_preserved() {
        let storage = create_test_storage();
        let content = "  line one\n\tline two\n\n  trailing  ";

        let stored = storage.insert_message(content).unwrap();
        let retrieved = storage.get_message(&stored.id).unwrap().unwrap();

        assert_eq!(retrieved.content, content);
    }

    #[test]
    fn test_unicode_content() {
        let storage = create_test_storage();
        let content = "Hello 世界 🌍 مرحبا";

        let stored = storage.insert_message(content).unwrap();
        let retrieved = storage.get_message(&stored.id).unwrap().unwrap();

        assert_eq!(retrieved.content, content);
    }

    #[test]
    fn test_large_content() {
        let storage = create_test_storage();
        let content = "x".repeat(100_000);

        let stored = storage.insert_message(&content).unwrap();
        let retrieved = storage.get_message(&stored.id).unwrap().unwrap();

        assert_eq!(retrieved.content_len(), 100_000);
    }

    #[test]
    fn test_config_roundtrip() {
        let storage = create_test_storage();
        assert!(storage.get_config("domain").unwrap().is_none());

        storage.set_config("domain", "share.example.org").unwrap();
        assert_eq!(
            storage.get_config("domain").unwrap().as_deref(),
            Some("share.example.org")
        );

        storage.set_config("domain", "other.example.org").unwrap();
        assert_eq!(
            storage.get_config("domain").unwrap().as_deref(),
            Some("other.example.org")
        );
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_messages, 0);
        assert!(stats.oldest_message.is_none());
        assert!(stats.newest_message.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        storage.insert_message("First").unwrap();
        storage.insert_message("Second").unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_messages, 2);
        assert!(stats.oldest_message.is_some());
        assert!(stats.newest_message.is_some());
        assert!(stats.oldest_message <= stats.newest_message);
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_open_file_based_persists() {
        let db_path = temp_db_path("persist");

        let id = {
            let storage = Storage::open(&db_path).unwrap();
            assert_eq!(storage.path(), db_path);
            storage.insert_message("survives reopen").unwrap().id
        };

        let storage = Storage::open(&db_path).unwrap();
        let retrieved = storage.get_message(&id).unwrap().unwrap();
        assert_eq!(retrieved.content, "survives reopen");
        assert!(storage.stats().unwrap().db_size_bytes > 0);

        drop(storage);
        remove_db(&db_path);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let root = std::env::temp_dir().join(format!("secretqr_nested_{}", std::process::id()));
        let nested_path = root.join("nested/messages.db");
        let _ = std::fs::remove_dir_all(&root);

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());

        drop(storage);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_sqlite_store_trait_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.backend_name(), "sqlite");

        let stored = store.insert_message("via trait").await.unwrap();
        let found = store.find_message(&stored.id).await.unwrap().unwrap();
        assert_eq!(found.content, "via trait");

        let missing = MessageId::parse("missing").unwrap();
        assert!(store.find_message(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_store_find_config() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.find_config("domain").await.unwrap().is_none());

        store
            .storage()
            .unwrap()
            .set_config("domain", "share.example.org")
            .unwrap();
        assert_eq!(
            store.find_config("domain").await.unwrap().as_deref(),
            Some("share.example.org")
        );
    }
}
