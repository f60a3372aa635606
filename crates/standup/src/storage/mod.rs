//! Storage layer for standup.
//!
//! This module provides `SQLite`-based persistent storage for the member
//! directory and standup entries. Queries for each table live in their own
//! submodule as further `impl Storage` blocks.

pub mod migrations;
pub mod schema;

mod members;
mod standups;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use standups::StandupFilter;

/// How long a connection waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Entries must reference an existing member.
const ENFORCE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = ON;";

/// Format used for the `date` column.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage engine for members and standup entries.
///
/// Each `Storage` owns one connection. Several `Storage` values may point at
/// the same file; writers are serialized by `SQLite` and the busy timeout.
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
    /// Initializes the schema if this is a new database.
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

        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        // WAL lets readers proceed while a submission is being written
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(ENFORCE_FOREIGN_KEYS)?;

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

        conn.execute_batch(ENFORCE_FOREIGN_KEYS)?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Change how long this connection waits for a lock held by another writer.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` rejects the setting.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_in_memory(&self) -> bool {
        self.path.to_string_lossy() == ":memory:"
    }

    /// Begin a write transaction that takes the database lock up front.
    fn write_transaction(&self) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_members = self.count_members()?;
        let total_standups = self.count_standups()?;

        let (oldest, newest): (Option<String>, Option<String>) =
            self.conn
                .query_row("SELECT MIN(date), MAX(date) FROM standups", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;

        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_members,
            total_standups,
            oldest_date: oldest.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
            newest_date: newest.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()),
            db_size_bytes,
        })
    }

    /// Delete every member and standup and restart id numbering.
    ///
    /// Returns the number of members and standups removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn reset(&self) -> Result<ResetSummary> {
        let tx = self.write_transaction()?;
        let standups_deleted = tx.execute("DELETE FROM standups", [])?;
        let members_deleted = tx.execute("DELETE FROM members", [])?;
        tx.execute(
            "DELETE FROM sqlite_sequence WHERE name IN ('standups', 'members')",
            [],
        )?;
        tx.commit()?;

        info!(
            "Reset database: removed {} members and {} standups",
            members_deleted, standups_deleted
        );
        Ok(ResetSummary {
            members_deleted,
            standups_deleted,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Number of members in the directory.
    pub total_members: i64,
    /// Number of stored standup entries.
    pub total_standups: i64,
    /// Earliest day with an entry.
    pub oldest_date: Option<NaiveDate>,
    /// Latest day with an entry.
    pub newest_date: Option<NaiveDate>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// What [`Storage::reset`] removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    /// Members deleted.
    pub members_deleted: usize,
    /// Standups deleted.
    pub standups_deleted: usize,
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::StandupContent;
    use crate::member::{NewMember, Region};

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_path() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_stats_empty() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();

        assert_eq!(stats.total_members, 0);
        assert_eq!(stats.total_standups, 0);
        assert!(stats.oldest_date.is_none());
        assert!(stats.newest_date.is_none());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_stats_with_data() {
        let storage = create_test_storage();
        let ana = storage
            .insert_member(&NewMember::new("Ana", Region::London), Utc::now())
            .unwrap();
        let content = StandupContent::default();
        storage
            .upsert_standup(ana.id, day(2024, 1, 9), &content, Utc::now())
            .unwrap();
        storage
            .upsert_standup(ana.id, day(2024, 1, 11), &content, Utc::now())
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_members, 1);
        assert_eq!(stats.total_standups, 2);
        assert_eq!(stats.oldest_date, Some(day(2024, 1, 9)));
        assert_eq!(stats.newest_date, Some(day(2024, 1, 11)));
    }

    #[test]
    fn test_reset_clears_and_restarts_ids() {
        let storage = create_test_storage();
        let ana = storage
            .insert_member(&NewMember::new("Ana", Region::London), Utc::now())
            .unwrap();
        storage
            .upsert_standup(
                ana.id,
                day(2024, 1, 10),
                &StandupContent::default(),
                Utc::now(),
            )
            .unwrap();

        let summary = storage.reset().unwrap();
        assert_eq!(summary.members_deleted, 1);
        assert_eq!(summary.standups_deleted, 1);
        assert_eq!(storage.count_members().unwrap(), 0);

        let again = storage
            .insert_member(&NewMember::new("Ben", Region::Dallas), Utc::now())
            .unwrap();
        assert_eq!(again.id, 1);
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = format_timestamp(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let b = format_timestamp(DateTime::from_timestamp(1_700_000_000, 500_000_000).unwrap());
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(day(2024, 1, 5)), "2024-01-05");
    }

    #[test]
    fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("standup.db");

        let storage = Storage::open(&db_path).unwrap();
        storage
            .insert_member(&NewMember::new("Ana", Region::London), Utc::now())
            .unwrap();
        assert_eq!(storage.path(), db_path);
        assert!(storage.stats().unwrap().db_size_bytes > 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/standup.db");

        let storage = Storage::open(&nested_path).unwrap();
        assert!(nested_path.exists());
        drop(storage);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("standup.db");

        {
            let storage = Storage::open(&db_path).unwrap();
            storage
                .insert_member(&NewMember::new("Ana", Region::London), Utc::now())
                .unwrap();
        }

        let storage = Storage::open(&db_path).unwrap();
        assert_eq!(storage.count_members().unwrap(), 1);
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let storage = create_test_storage();
        let enabled: i64 = storage
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);

        let err = storage
            .upsert_standup(42, day(2024, 1, 10), &StandupContent::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::DatabaseQuery(_)));
        assert_eq!(storage.count_standups().unwrap(), 0);
    }

    #[test]
    fn test_file_storage_enforces_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join("standup.db")).unwrap();
        let enabled: i64 = storage
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_set_busy_timeout() {
        let storage = create_test_storage();
        assert!(storage.set_busy_timeout(Duration::from_millis(250)).is_ok());
    }
}
