//! `SQLite` schema definitions for the local message store.
//!
//! The two application tables mirror the hosted store: `messages` holds the
//! secret texts and `config` holds key/value settings such as the share
//! domain. `metadata` is private bookkeeping for migrations.

/// SQL statement to create the messages table.
///
/// `id` is generated by the store (a random UUID), never by callers.
pub const CREATE_MESSAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `created_at` for statistics.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at)
";

/// SQL statement to create the application config table.
pub const CREATE_CONFIG_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_MESSAGES_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_CONFIG_TABLE,
    CREATE_METADATA_TABLE,
];
