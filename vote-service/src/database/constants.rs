//! Database migration constants and metadata

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Migration descriptions, indexed by version - 1
pub const MIGRATION_DESCRIPTIONS: &[&str] = &["Append-only votes table"];

/// Default database file name
pub const DEFAULT_DB_PATH: &str = "ballot.db";

/// Keyword selecting a private in-memory database
pub const MEMORY_DB_PATH: &str = ":memory:";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;
