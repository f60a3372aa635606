//! Member directory queries.

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::member::{Member, NewMember, Region, Role};

use super::{conversion_error, format_timestamp, timestamp_column, Storage};

const MEMBER_COLUMNS: &str = "id, name, region, role, created_at";

impl Storage {
    /// Insert a new member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateMember`] if the name is taken, or a storage
    /// error if the database operation fails.
    pub fn insert_member(&self, new: &NewMember, now: DateTime<Utc>) -> Result<Member> {
        let created_at = now.trunc_subsecs(6);
        let result = self.conn.execute(
            "INSERT INTO members (name, region, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                new.name,
                new.region.as_str(),
                new.role.to_string(),
                format_timestamp(created_at),
            ],
        );

        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(Error::DuplicateMember {
                    name: new.name.clone(),
                })
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        debug!("Inserted member {} with id {}", new.name, id);
        Ok(Member {
            id,
            name: new.name.clone(),
            region: new.region,
            role: new.role,
            created_at,
        })
    }

    /// Get a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_member(&self, id: i64) -> Result<Option<Member>> {
        let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?1");
        let member = self
            .conn
            .query_row(&sql, [id], Self::row_to_member)
            .optional()?;
        Ok(member)
    }

    /// Get a member together with their stored credential digest, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn member_credential(&self, id: i64) -> Result<Option<(Member, Option<String>)>> {
        let sql = format!("SELECT {MEMBER_COLUMNS}, credential_digest FROM members WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id], |row| {
                Ok((Self::row_to_member(row)?, row.get(5)?))
            })
            .optional()?;
        Ok(row)
    }

    /// Replace a member's credential digest.
    ///
    /// Returns `false` if no member has the given id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn set_credential_digest(&self, id: i64, digest: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE members SET credential_digest = ?1 WHERE id = ?2",
            params![digest, id],
        )?;
        Ok(affected > 0)
    }

    /// List members ordered by name, optionally restricted to one region.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_members(&self, region: Option<Region>) -> Result<Vec<Member>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE (?1 IS NULL OR region = ?1) ORDER BY name ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let members = stmt
            .query_map([region.map(Region::as_str)], Self::row_to_member)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }

    /// Distinct regions that currently have members, in alphabetical order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn member_regions(&self) -> Result<Vec<Region>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT region FROM members ORDER BY region ASC")?;
        let regions = stmt
            .query_map([], |row| {
                let raw: String = row.get(0)?;
                raw.parse::<Region>().map_err(|e| conversion_error(0, e))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(regions)
    }

    /// Count members in the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_members(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Convert a database row to a Member struct.
    fn row_to_member(row: &rusqlite::Row) -> rusqlite::Result<Member> {
        let region: String = row.get(2)?;
        let role: String = row.get(3)?;
        Ok(Member {
            id: row.get(0)?,
            name: row.get(1)?,
            region: region.parse().map_err(|e| conversion_error(2, e))?,
            role: role.parse::<Role>().map_err(|e| conversion_error(3, e))?,
            created_at: timestamp_column(row, 4)?,
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
