//! Command-line interface for standup.
//!
//! This module provides the CLI structure for the `standup` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    BoardCommand, ConfigCommand, JsonFlag, ListCommand, MemberCommand, ResetCommand,
    SubmitCommand, ViewerArgs,
};

/// standup - Share daily status updates with your team
///
/// Members record what they did yesterday, what they plan today and what is
/// blocking them. Today's entries stay private to their author and admins.
#[derive(Debug, Parser)]
#[command(name = "standup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage team members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Submit or overwrite a standup entry
    Submit(SubmitCommand),

    /// Show your status and the team's entries for a day
    Board(BoardCommand),

    /// List stored entries without visibility rules
    List(ListCommand),

    /// List regions that have members
    Regions(JsonFlag),

    /// Show database statistics
    Stats(JsonFlag),

    /// Delete all members and entries
    Reset(ResetCommand),

    /// Serve JSON requests on stdin, one per line
    Api,

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
