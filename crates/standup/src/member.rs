//! Member identity types.
//!
//! A [`Member`] is one participant in the team directory. Credentials never
//! appear on this type; the storage layer keeps only a digest.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a member, controlling same-day visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sees every entry, including other members' entries for today.
    Admin,
    /// Sees only their own entry for today.
    #[default]
    Member,
}

impl Role {
    /// Whether this role bypasses the same-day privacy rule.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string could not be parsed as a [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}' (expected admin or member)")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Office location used to group members.
///
/// Serializes with its canonical spelling; input is matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Region {
    /// Bengaluru, India.
    Bengaluru,
    /// Dallas, US.
    Dallas,
    /// London, UK.
    London,
    /// New York, US.
    #[serde(rename = "New York")]
    NewYork,
}

impl Region {
    /// All known regions, in display order.
    pub const ALL: [Region; 4] = [
        Region::Bengaluru,
        Region::Dallas,
        Region::London,
        Region::NewYork,
    ];

    /// Canonical spelling, as stored and displayed.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bengaluru => "Bengaluru",
            Self::Dallas => "Dallas",
            Self::London => "London",
            Self::NewYork => "New York",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string could not be parsed as a [`Region`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown region '{0}' (expected one of Bengaluru, Dallas, London, New York)")]
pub struct ParseRegionError(String);

impl FromStr for Region {
    type Err = ParseRegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|region| region.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseRegionError(s.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = ParseRegionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A team member, as returned across the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Stable identifier assigned by storage.
    pub id: i64,
    /// Unique display name.
    pub name: String,
    /// Office location.
    pub region: Region,
    /// Access role.
    pub role: Role,
    /// When the member was added.
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Whether this member may see other members' same-day entries.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Fields needed to add a member to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    /// Display name; must be unique.
    pub name: String,
    /// Office location.
    pub region: Region,
    /// Access role.
    #[serde(default)]
    pub role: Role,
}

impl NewMember {
    /// Create a new member description with the default role.
    #[must_use]
    pub fn new(name: impl Into<String>, region: Region) -> Self {
        Self {
            name: name.into(),
            region,
            role: Role::default(),
        }
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Caller-supplied identity, passed explicitly on every call that needs one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// The member claiming to be the caller.
    pub member_id: i64,
    /// The member's secret.
    pub credential: String,
}

impl Identity {
    /// Create a new identity.
    #[must_use]
    pub fn new(member_id: i64, credential: impl Into<String>) -> Self {
        Self {
            member_id,
            credential: credential.into(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("member_id", &self.member_id)
            .field("credential", &"<redacted>")
            .finish()
    }
}
