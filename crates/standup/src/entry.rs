//! Standup entry types.
//!
//! A [`StandupEntry`] is one member's status for one calendar day. At most
//! one exists per `(member_id, date)`; repeated submissions overwrite it in
//! place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::member::Region;

/// One member's recorded status for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandupEntry {
    /// Identifier assigned by storage. Stable across overwrites.
    pub id: i64,
    /// The owning member.
    pub member_id: i64,
    /// Calendar day the entry is for.
    pub date: NaiveDate,
    /// Work done on the previous day.
    pub yesterday: String,
    /// Work planned for this day.
    pub today: String,
    /// Anything in the way.
    pub blockers: String,
    /// When the entry was first submitted. Never changed by overwrites.
    pub created_at: DateTime<Utc>,
    /// When the entry was last written.
    pub updated_at: DateTime<Utc>,
}

impl StandupEntry {
    /// Whether all three bodies are empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.yesterday.is_empty() && self.today.is_empty() && self.blockers.is_empty()
    }
}

/// A standup entry joined with its member's display fields.
///
/// `member_name` and `region` are `None` when the owning member no longer
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    /// The stored entry.
    #[serde(flatten)]
    pub entry: StandupEntry,
    /// Name of the owning member.
    pub member_name: Option<String>,
    /// Region of the owning member.
    pub region: Option<Region>,
}

impl EntryView {
    /// The owning member's id.
    #[must_use]
    pub fn member_id(&self) -> i64 {
        self.entry.member_id
    }
}

/// The three rich-text bodies of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandupContent {
    /// Work done on the previous day.
    pub yesterday: String,
    /// Work planned for this day.
    pub today: String,
    /// Anything in the way.
    pub blockers: String,
}

/// An incoming standup submission.
///
/// Omitted bodies are stored as empty strings; an omitted date means the
/// submitter's current calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Who is submitting.
    pub member_id: i64,
    /// Day the entry is for.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Work done on the previous day.
    #[serde(default)]
    pub yesterday: Option<String>,
    /// Work planned for this day.
    #[serde(default)]
    pub today: Option<String>,
    /// Anything in the way.
    #[serde(default)]
    pub blockers: Option<String>,
}

impl Submission {
    /// Start a submission for the given member.
    #[must_use]
    pub fn new(member_id: i64) -> Self {
        Self {
            member_id,
            ..Self::default()
        }
    }

    /// Set the target date.
    #[must_use]
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the "yesterday" body.
    #[must_use]
    pub fn yesterday(mut self, body: impl Into<String>) -> Self {
        self.yesterday = Some(body.into());
        self
    }

    /// Set the "today" body.
    #[must_use]
    pub fn today(mut self, body: impl Into<String>) -> Self {
        self.today = Some(body.into());
        self
    }

    /// Set the "blockers" body.
    #[must_use]
    pub fn blockers(mut self, body: impl Into<String>) -> Self {
        self.blockers = Some(body.into());
        self
    }

    /// The bodies to store, with omitted fields as empty strings.
    #[must_use]
    pub fn content(&self) -> StandupContent {
        StandupContent {
            yesterday: self.yesterday.clone().unwrap_or_default(),
            today: self.today.clone().unwrap_or_default(),
            blockers: self.blockers.clone().unwrap_or_default(),
        }
    }
}

/// Lifecycle of the entry for one `(member_id, date)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Nothing submitted yet for this key.
    Absent,
    /// An entry exists. Terminal for the day.
    Present,
}

/// What a submission did to the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// A new entry was created.
    Created,
    /// The existing entry was overwritten.
    Updated,
}

impl EntryState {
    /// Apply a submission, returning the next state and what happened.
    ///
    /// Every submission lands in [`EntryState::Present`]; there is no path
    /// back to [`EntryState::Absent`].
    #[must_use]
    pub fn on_submit(self) -> (Self, Transition) {
        match self {
            Self::Absent => (Self::Present, Transition::Created),
            Self::Present => (Self::Present, Transition::Updated),
        }
    }
}

/// Result of a submission: the entry id and whether it was created or updated.
///
/// Serializes as `{"id": 1, "created": true}` or `{"id": 1, "updated": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Id of the stored entry.
    pub id: i64,
    /// Set when this submission created the entry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub created: bool,
    /// Set when this submission overwrote an existing entry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub updated: bool,
}

impl SubmitOutcome {
    /// Build the outcome for a transition on the entry with the given id.
    #[must_use]
    pub fn new(id: i64, transition: Transition) -> Self {
        Self {
            id,
            created: transition == Transition::Created,
            updated: transition == Transition::Updated,
        }
    }

    /// The transition this outcome reports.
    #[must_use]
    pub fn transition(&self) -> Transition {
        if self.created {
            Transition::Created
        } else {
            Transition::Updated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        let (state, transition) = EntryState::Absent.on_submit();
        assert_eq!(state, EntryState::Present);
        assert_eq!(transition, Transition::Created);

        let (state, transition) = state.on_submit();
        assert_eq!(state, EntryState::Present);
        assert_eq!(transition, Transition::Updated);
    }

    #[test]
    fn test_submission_content_defaults_to_empty() {
        let submission = Submission::new(1).today("Design review");
        let content = submission.content();
        assert_eq!(content.today, "Design review");
        assert_eq!(content.yesterday, "");
        assert_eq!(content.blockers, "");
    }

    #[test]
    fn test_submission_builder() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let submission = Submission::new(3)
            .on(date)
            .yesterday("a")
            .today("b")
            .blockers("c");
        assert_eq!(submission.member_id, 3);
        assert_eq!(submission.date, Some(date));
        assert_eq!(
            submission.content(),
            StandupContent {
                yesterday: "a".to_string(),
                today: "b".to_string(),
                blockers: "c".to_string(),
            }
        );
    }

    #[test]
    fn test_submission_deserialize_minimal() {
        let submission: Submission = serde_json::from_str(r#"{"member_id": 4}"#).unwrap();
        assert_eq!(submission.member_id, 4);
        assert!(submission.date.is_none());
        assert!(submission.today.is_none());
    }

    #[test]
    fn test_submission_deserialize_date() {
        let submission: Submission =
            serde_json::from_str(r#"{"member_id": 4, "date": "2024-01-10"}"#).unwrap();
        assert_eq!(submission.date, NaiveDate::from_ymd_opt(2024, 1, 10));
    }

    #[test]
    fn test_outcome_serializes_created() {
        let outcome = SubmitOutcome::new(1, Transition::Created);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "created": true}));
    }

    #[test]
    fn test_outcome_serializes_updated() {
        let outcome = SubmitOutcome::new(1, Transition::Updated);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "updated": true}));
        assert_eq!(outcome.transition(), Transition::Updated);
    }

    #[test]
    fn test_entry_view_flattens_entry() {
        let now = Utc::now();
        let view = EntryView {
            entry: StandupEntry {
                id: 9,
                member_id: 2,
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                yesterday: String::new(),
                today: "ship".to_string(),
                blockers: String::new(),
                created_at: now,
                updated_at: now,
            },
            member_name: Some("Ana".to_string()),
            region: Some(Region::London),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["date"], "2024-01-10");
        assert_eq!(json["member_name"], "Ana");
        assert_eq!(json["region"], "London");
        assert_eq!(view.member_id(), 2);
        assert!(!view.entry.is_blank());
    }
}
