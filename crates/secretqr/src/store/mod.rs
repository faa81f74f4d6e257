//! Message stores.
//!
//! The Send and Get flows only ever need three operations on two tables:
//! insert one message, select one message by id, and select one config value
//! by key. [`MessageStore`] captures exactly that surface so both views can run
//! against the local `SQLite` store or a hosted PostgREST endpoint.
//!
//! There is no way to list messages: a message is reachable only
//! through its identifier.

pub mod migrations;
pub mod rest;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::message::{Message, MessageId};

pub use rest::RestStore;
pub use sqlite::{SqliteStore, Storage, StorageStats};

/// Read/insert access to the `messages` and `config` tables.
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for logs and status output.
    fn backend_name(&self) -> &'static str;

    /// Insert a message and return the stored row, including its new id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write or is unreachable.
    async fn insert_message(&self, content: &str) -> Result<Message>;

    /// Look up a single message by exact id.
    ///
    /// Returns `Ok(None)` when no such message exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn find_message(&self, id: &MessageId) -> Result<Option<Message>>;

    /// Look up a single config value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn find_config(&self, key: &str) -> Result<Option<String>>;
}

/// Open the store selected by the configuration.
///
/// # Errors
///
/// Returns an error if the local database cannot be opened or the hosted
/// store client cannot be built.
pub fn open(config: &Config) -> Result<Arc<dyn MessageStore>> {
    let store: Arc<dyn MessageStore> = match config.store.backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(config.database_path())?),
        StoreBackend::Rest => Arc::new(RestStore::from_config(config)?),
    };
    info!(backend = store.backend_name(), "Message store ready");
    Ok(store)
}
