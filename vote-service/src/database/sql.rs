//! SQL statement constants for database operations

pub const CREATE_MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT NOT NULL
)
"#;

pub const CREATE_VOTES_TABLE_SQL: &str = r#"
CREATE TABLE votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    voter_id TEXT NOT NULL UNIQUE,
    choice_id TEXT NOT NULL,
    cast_at_micros INTEGER NOT NULL -- unix microseconds, UTC
)
"#;

pub const CREATE_DB_INDEXES: &[&str] =
    &["CREATE INDEX idx_votes_cast_at ON votes(cast_at_micros, id)"];

/// The ledger only ever grows.
pub const CREATE_APPEND_ONLY_TRIGGERS: &[&str] = &[
    r#"
CREATE TRIGGER votes_no_update BEFORE UPDATE ON votes
BEGIN
    SELECT RAISE(ABORT, 'votes are append-only');
END
"#,
    r#"
CREATE TRIGGER votes_no_delete BEFORE DELETE ON votes
BEGIN
    SELECT RAISE(ABORT, 'votes are append-only');
END
"#,
];

pub const SELECT_SCHEMA_VERSION_SQL: &str = "SELECT MAX(version) FROM schema_migrations";

pub const INSERT_MIGRATION_SQL: &str =
    "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)";

pub const INSERT_VOTE_SQL: &str =
    "INSERT INTO votes (voter_id, choice_id, cast_at_micros) VALUES (?, ?, ?)";

pub const SELECT_ALL_VOTES_SQL: &str =
    "SELECT id, voter_id, choice_id, cast_at_micros FROM votes ORDER BY cast_at_micros, id";

pub const SELECT_VOTES_PAGE_SQL: &str = "SELECT id, voter_id, choice_id, cast_at_micros FROM votes \
     ORDER BY cast_at_micros, id LIMIT ? OFFSET ?";

pub const SELECT_VOTE_BY_VOTER_SQL: &str =
    "SELECT id, voter_id, choice_id, cast_at_micros FROM votes WHERE voter_id = ?";

pub const COUNT_VOTES_SQL: &str = "SELECT COUNT(*) FROM votes";
