//! `SQLite` schema definitions for standup.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the members table.
pub const CREATE_MEMBERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    region TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'member',
    credential_digest TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the standups table.
///
/// `UNIQUE(member_id, date)` is what makes submission an upsert rather than
/// an append; it must not be relaxed.
pub const CREATE_STANDUPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS standups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id INTEGER NOT NULL REFERENCES members(id),
    date TEXT NOT NULL,
    yesterday TEXT NOT NULL DEFAULT '',
    today TEXT NOT NULL DEFAULT '',
    blockers TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(member_id, date)
)
";

/// SQL statement to create an index on date for the daily board.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_standups_date ON standups(date)
";

/// SQL statement to create an index on region for filtering members.
pub const CREATE_REGION_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_members_region ON members(region)
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
    CREATE_MEMBERS_TABLE,
    CREATE_STANDUPS_TABLE,
    CREATE_DATE_INDEX,
    CREATE_REGION_INDEX,
    CREATE_METADATA_TABLE,
];
