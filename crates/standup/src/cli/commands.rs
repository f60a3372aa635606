//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::member::{Identity, Region, Role};
use crate::storage::StandupFilter;

/// Member directory commands.
#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// List members ordered by name
    List {
        /// Only members in this region
        #[arg(short, long)]
        region: Option<Region>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a member
    Add {
        /// Unique display name
        name: String,

        /// Office region (Bengaluru, Dallas, London, New York)
        #[arg(short, long)]
        region: Region,

        /// Access role
        #[arg(long, default_value_t = Role::Member)]
        role: Role,

        /// Set an initial credential
        #[arg(long, value_name = "SECRET")]
        credential: Option<String>,
    },

    /// Check a member's credential
    Login {
        /// Member id
        id: i64,

        /// The member's secret
        #[arg(long, value_name = "SECRET")]
        credential: String,
    },

    /// Replace a member's credential
    Passwd {
        /// Member id
        id: i64,

        /// The new secret
        #[arg(long, value_name = "SECRET")]
        credential: String,
    },
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Submitting member's id
    #[arg(short, long)]
    pub member: i64,

    /// Day of the entry (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Work done on the previous day
    #[arg(long)]
    pub yesterday: Option<String>,

    /// Work planned for the day
    #[arg(long)]
    pub today: Option<String>,

    /// Anything in the way
    #[arg(long)]
    pub blockers: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Viewer identity flags for commands that apply visibility rules.
#[derive(Debug, Args)]
pub struct ViewerArgs {
    /// View as this member id (anonymous if omitted)
    #[arg(long = "as", value_name = "ID", requires = "credential")]
    pub member: Option<i64>,

    /// Credential for the viewing member
    #[arg(long, value_name = "SECRET", requires = "member")]
    pub credential: Option<String>,
}

impl ViewerArgs {
    /// The identity described by these flags, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        match (self.member, &self.credential) {
            (Some(member_id), Some(credential)) => Some(Identity::new(member_id, credential)),
            _ => None,
        }
    }
}

/// Board command arguments.
#[derive(Debug, Args)]
pub struct BoardCommand {
    /// Viewer identity
    #[command(flatten)]
    pub viewer: ViewerArgs,

    /// Day to show (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Only entries from members in this region
    #[arg(short, long)]
    pub region: Option<Region>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only entries for this day
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Only entries from this member id
    #[arg(short, long)]
    pub member: Option<i64>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ListCommand {
    /// The storage filter for these flags.
    #[must_use]
    pub fn filter(&self) -> StandupFilter {
        StandupFilter {
            date: self.date,
            member_id: self.member,
        }
    }
}

/// Arguments for commands whose only option is JSON output.
#[derive(Debug, Args)]
pub struct JsonFlag {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Confirm deleting every member and entry
    #[arg(short, long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_identity() {
        let viewer = ViewerArgs {
            member: Some(3),
            credential: Some("secret".to_string()),
        };
        let identity = viewer.identity().unwrap();
        assert_eq!(identity.member_id, 3);
        assert_eq!(identity.credential, "secret");
    }

    #[test]
    fn test_viewer_anonymous() {
        let viewer = ViewerArgs {
            member: None,
            credential: None,
        };
        assert!(viewer.identity().is_none());
    }

    #[test]
    fn test_list_filter() {
        let cmd = ListCommand {
            date: NaiveDate::from_ymd_opt(2024, 1, 10),
            member: Some(2),
            json: false,
        };
        let filter = cmd.filter();
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 1, 10));
        assert_eq!(filter.member_id, Some(2));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
