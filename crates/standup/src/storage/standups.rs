//! Standup entry queries.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entry::{EntryState, EntryView, StandupContent, StandupEntry};
use crate::error::Result;
use crate::member::Region;

use super::{
    conversion_error, date_column, format_date, format_timestamp, timestamp_column, Storage,
};

/// Columns selected for an [`EntryView`], joined against `members`.
const VIEW_SELECT: &str = r"
SELECT s.id, s.member_id, s.date, s.yesterday, s.today, s.blockers,
       s.created_at, s.updated_at, m.name, m.region
FROM standups s
LEFT JOIN members m ON s.member_id = m.id
";

/// Optional filters for listing standups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandupFilter {
    /// Only entries for this day.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Only entries owned by this member.
    #[serde(default)]
    pub member_id: Option<i64>,
}

impl Storage {
    /// Create or overwrite the entry for `(member_id, date)`.
    ///
    /// Returns the entry id and the state the key was in before this write.
    /// The insert and the conflict-triggered update run in one immediate
    /// transaction, so concurrent writers for the same key never produce a
    /// second row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_standup(
        &self,
        member_id: i64,
        date: NaiveDate,
        content: &StandupContent,
        now: DateTime<Utc>,
    ) -> Result<(i64, EntryState)> {
        let date_str = format_date(date);
        let now_str = format_timestamp(now.trunc_subsecs(6));

        let tx = self.write_transaction()?;
        let inserted = tx.execute(
            r"
            INSERT INTO standups
                (member_id, date, yesterday, today, blockers, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(member_id, date) DO NOTHING
            ",
            params![
                member_id,
                date_str,
                content.yesterday,
                content.today,
                content.blockers,
                now_str,
            ],
        )?;

        let result = if inserted == 1 {
            (tx.last_insert_rowid(), EntryState::Absent)
        } else {
            let id: i64 = tx.query_row(
                r"
                UPDATE standups
                SET yesterday = ?3, today = ?4, blockers = ?5, updated_at = ?6
                WHERE member_id = ?1 AND date = ?2
                RETURNING id
                ",
                params![
                    member_id,
                    date_str,
                    content.yesterday,
                    content.today,
                    content.blockers,
                    now_str,
                ],
                |row| row.get(0),
            )?;
            (id, EntryState::Present)
        };
        tx.commit()?;

        debug!(
            "Upserted standup {} for member {} on {} (was {:?})",
            result.0, member_id, date_str, result.1
        );
        Ok(result)
    }

    /// Get the entry for one member on one day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_standup(&self, member_id: i64, date: NaiveDate) -> Result<Option<EntryView>> {
        let sql = format!("{VIEW_SELECT} WHERE s.member_id = ?1 AND s.date = ?2");
        let view = self
            .conn
            .query_row(
                &sql,
                params![member_id, format_date(date)],
                Self::row_to_view,
            )
            .optional()?;
        Ok(view)
    }

    /// All entries for one day, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn standups_on(&self, date: NaiveDate) -> Result<Vec<EntryView>> {
        self.list_standups(&StandupFilter {
            date: Some(date),
            member_id: None,
        })
    }

    /// List entries matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_standups(&self, filter: &StandupFilter) -> Result<Vec<EntryView>> {
        let sql = format!(
            "{VIEW_SELECT}
             WHERE (?1 IS NULL OR s.date = ?1) AND (?2 IS NULL OR s.member_id = ?2)
             ORDER BY s.created_at DESC, s.id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let views = stmt
            .query_map(
                params![filter.date.map(format_date), filter.member_id],
                Self::row_to_view,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(views)
    }

    /// Count stored entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_standups(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM standups", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a joined database row to an `EntryView`.
    fn row_to_view(row: &rusqlite::Row) -> rusqlite::Result<EntryView> {
        let region: Option<String> = row.get(9)?;
        let region = region
            .map(|raw| raw.parse::<Region>())
            .transpose()
            .map_err(|e| conversion_error(9, e))?;

        Ok(EntryView {
            entry: StandupEntry {
                id: row.get(0)?,
                member_id: row.get(1)?,
                date: date_column(row, 2)?,
                yesterday: row.get(3)?,
                today: row.get(4)?,
                blockers: row.get(5)?,
                created_at: timestamp_column(row, 6)?,
                updated_at: timestamp_column(row, 7)?,
            },
            member_name: row.get(8)?,
            region,
        })
    }
}
