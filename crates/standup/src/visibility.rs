//! Visibility policy: which entries a viewer may see for a given day.
//!
//! Today's entries are private to their author and to admins. Entries for
//! any other day are visible to everyone, anonymous viewers included. The
//! viewer's own status is reported separately from the team, falling back to
//! the previous day's entry as a plan when nothing exists for the day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::entry::EntryView;
use crate::error::Result;
use crate::member::{Member, Region};
use crate::storage::Storage;

/// The viewer's own status for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelfStatus {
    /// The viewer has an entry for the selected day.
    Today {
        /// The viewer's entry.
        entry: EntryView,
    },
    /// No entry for the selected day; this is the previous day's entry,
    /// shown as the plan carried over.
    PlanFromYesterday {
        /// The viewer's entry for the previous day.
        entry: EntryView,
    },
    /// No entry for the selected day or the one before.
    Empty,
}

impl SelfStatus {
    /// The entry backing this status, if any.
    #[must_use]
    pub fn entry(&self) -> Option<&EntryView> {
        match self {
            Self::Today { entry } | Self::PlanFromYesterday { entry } => Some(entry),
            Self::Empty => None,
        }
    }

    /// Whether this status is the previous day's plan.
    #[must_use]
    pub fn is_plan(&self) -> bool {
        matches!(self, Self::PlanFromYesterday { .. })
    }
}

/// Everything a viewer sees for one day: their own status and the team's.
///
/// `team` never contains an entry owned by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// The day shown.
    pub date: NaiveDate,
    /// Whether `date` is the current calendar day.
    pub is_today: bool,
    /// Region filter applied to the team list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// The viewer's own status; absent for anonymous viewers.
    pub self_status: Option<SelfStatus>,
    /// Other members' entries the viewer may see, newest first.
    pub team: Vec<EntryView>,
}

/// Whether an entry passes the region filter.
///
/// Entries whose member no longer exists have no region and never match a
/// filter.
#[must_use]
pub fn matches_region(entry: &EntryView, region: Option<Region>) -> bool {
    region.is_none() || entry.region == region
}

/// Whether `viewer` may see `entry`, given whether its day is today.
///
/// On any day other than today every entry is visible. Today, only admins
/// see other members' entries; everyone else sees only their own, and an
/// anonymous viewer sees nothing.
#[must_use]
pub fn may_view(viewer: Option<&Member>, entry: &EntryView, is_today: bool) -> bool {
    if !is_today {
        return true;
    }
    match viewer {
        Some(member) if member.is_admin() => true,
        Some(member) => entry.member_id() == member.id,
        None => false,
    }
}

/// Applies the visibility rules against stored entries.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityPolicy<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
}

impl<'a> VisibilityPolicy<'a> {
    /// Create a policy engine over the given storage and clock.
    #[must_use]
    pub fn new(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self { storage, clock }
    }

    /// Whether `date` is the clock's current day.
    #[must_use]
    pub fn is_today(&self, date: NaiveDate) -> bool {
        date == self.clock.today()
    }

    /// Entries for `date` that `viewer` may see, after the region filter.
    ///
    /// Includes the viewer's own entry when it passes the filter.
    ///
    /// # Errors
    ///
    /// Returns a storage error if entries cannot be read.
    pub fn query(
        &self,
        viewer: Option<&Member>,
        date: NaiveDate,
        region: Option<Region>,
    ) -> Result<Vec<EntryView>> {
        let is_today = self.is_today(date);
        let visible: Vec<EntryView> = self
            .storage
            .standups_on(date)?
            .into_iter()
            .filter(|entry| matches_region(entry, region))
            .filter(|entry| may_view(viewer, entry, is_today))
            .collect();

        debug!(
            "Viewer {:?} sees {} entries on {} (today: {})",
            viewer.map(|m| m.id),
            visible.len(),
            date,
            is_today
        );
        Ok(visible)
    }

    /// The viewer's own status for `date`, falling back to the day before.
    ///
    /// # Errors
    ///
    /// Returns a storage error if entries cannot be read.
    pub fn self_status(&self, viewer: &Member, date: NaiveDate) -> Result<SelfStatus> {
        if let Some(entry) = self.storage.get_standup(viewer.id, date)? {
            return Ok(SelfStatus::Today { entry });
        }

        let previous = match date.pred_opt() {
            Some(previous) => self.storage.get_standup(viewer.id, previous)?,
            None => None,
        };
        Ok(previous.map_or(SelfStatus::Empty, |entry| {
            SelfStatus::PlanFromYesterday { entry }
        }))
    }

    /// The viewer's board for `date`: own status plus the team list.
    ///
    /// # Errors
    ///
    /// Returns a storage error if entries cannot be read.
    pub fn board(
        &self,
        viewer: Option<&Member>,
        date: NaiveDate,
        region: Option<Region>,
    ) -> Result<Board> {
        let self_status = viewer
            .map(|member| self.self_status(member, date))
            .transpose()?;

        let viewer_id = viewer.map(|member| member.id);
        let team = self
            .query(viewer, date, region)?
            .into_iter()
            .filter(|entry| Some(entry.member_id()) != viewer_id)
            .collect();

        Ok(Board {
            date,
            is_today: self.is_today(date),
            region,
            self_status,
            team,
        })
    }
}
