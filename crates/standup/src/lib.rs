//! `standup` - Daily team status updates with date- and role-aware visibility
//!
//! Members record one entry per calendar day (yesterday, today, blockers).
//! Entries for the current day are private to their author and to admins;
//! entries for any other day are visible to everyone. [`StandupService`] is
//! the request/response boundary over the member directory, the submission
//! coordinator and the visibility policy.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod directory;
pub mod entry;
pub mod error;
pub mod logging;
pub mod member;
pub mod service;
pub mod storage;
pub mod submission;
pub mod visibility;

pub use api::{Request, Response};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use entry::{EntryState, EntryView, StandupEntry, Submission, SubmitOutcome, Transition};
pub use error::{Error, ErrorKind, Result};
pub use logging::init_logging;
pub use member::{Identity, Member, NewMember, Region, Role};
pub use service::StandupService;
pub use storage::{StandupFilter, Storage, StorageStats};
pub use visibility::{Board, SelfStatus};
