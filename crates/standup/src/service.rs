//! The request/response facade over the standup core.
//!
//! [`StandupService`] owns the store and the clock and exposes each boundary
//! operation as one method. Operations that depend on who is asking take an
//! explicit [`Identity`] and authenticate it on every call.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::directory::{MemberDirectory, DEFAULT_MIN_CREDENTIAL_LENGTH};
use crate::entry::{EntryView, Submission, SubmitOutcome};
use crate::error::Result;
use crate::member::{Identity, Member, NewMember, Region};
use crate::storage::{ResetSummary, StandupFilter, Storage, StorageStats};
use crate::submission::SubmissionCoordinator;
use crate::visibility::{Board, VisibilityPolicy};

/// Entry point for every standup operation.
#[derive(Debug)]
pub struct StandupService {
    storage: Storage,
    clock: Box<dyn Clock>,
    min_credential_length: usize,
}

impl StandupService {
    /// Create a service over an open store and a clock.
    #[must_use]
    pub fn new(storage: Storage, clock: impl Clock + 'static) -> Self {
        Self {
            storage,
            clock: Box::new(clock),
            min_credential_length: DEFAULT_MIN_CREDENTIAL_LENGTH,
        }
    }

    /// Use a different minimum credential length.
    #[must_use]
    pub fn with_min_credential_length(mut self, min: usize) -> Self {
        self.min_credential_length = min;
        self
    }

    /// Open the configured database with the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        storage.set_busy_timeout(config.busy_timeout())?;

        let clock = SystemClock::with_offset(config.utc_offset());
        debug!("Calendar days start at UTC{}", clock.offset());

        Ok(Self::new(storage, clock)
            .with_min_credential_length(config.directory.min_credential_length))
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The current calendar day according to the service clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn directory(&self) -> MemberDirectory<'_> {
        MemberDirectory::new(&self.storage, self.clock.as_ref())
            .with_min_credential_length(self.min_credential_length)
    }

    fn policy(&self) -> VisibilityPolicy<'_> {
        VisibilityPolicy::new(&self.storage, self.clock.as_ref())
    }

    /// Members ordered by name, optionally restricted to one region.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn list_members(&self, region: Option<Region>) -> Result<Vec<Member>> {
        self.directory().list_members(region)
    }

    /// Look up one member.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if no member has this id.
    pub fn get_member(&self, id: i64) -> Result<Member> {
        self.directory().get_member(id)
    }

    /// Add a member and return its id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank name and `DuplicateMember` on a
    /// name collision.
    pub fn add_member(&self, new: &NewMember) -> Result<i64> {
        self.directory().add_member(new)
    }

    /// Check an identity and return the member it names.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` or `InvalidCredential`.
    pub fn authenticate(&self, identity: &Identity) -> Result<Member> {
        self.directory()
            .authenticate(identity.member_id, &identity.credential)
    }

    /// Replace a member's credential.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the credential is too short and
    /// `MemberNotFound` if the member is unknown.
    pub fn change_credential(&self, member_id: i64, credential: &str) -> Result<()> {
        self.directory().change_credential(member_id, credential)
    }

    /// Raw entry listing, not subject to visibility rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error if entries cannot be read.
    pub fn list_standups(&self, filter: &StandupFilter) -> Result<Vec<EntryView>> {
        self.storage.list_standups(filter)
    }

    /// Create or overwrite a member's entry for a day.
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` if the member does not exist.
    pub fn submit(&self, submission: &Submission) -> Result<SubmitOutcome> {
        SubmissionCoordinator::new(&self.storage, self.clock.as_ref()).submit(submission)
    }

    /// Entries visible to `viewer` for a day (default today).
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` or `InvalidCredential` if the identity does
    /// not authenticate.
    pub fn query(
        &self,
        viewer: Option<&Identity>,
        date: Option<NaiveDate>,
        region: Option<Region>,
    ) -> Result<Vec<EntryView>> {
        let viewer = self.resolve_viewer(viewer)?;
        let date = date.unwrap_or_else(|| self.today());
        self.policy().query(viewer.as_ref(), date, region)
    }

    /// The viewer's board for a day (default today).
    ///
    /// # Errors
    ///
    /// Returns `MemberNotFound` or `InvalidCredential` if the identity does
    /// not authenticate.
    pub fn board(
        &self,
        viewer: Option<&Identity>,
        date: Option<NaiveDate>,
        region: Option<Region>,
    ) -> Result<Board> {
        let viewer = self.resolve_viewer(viewer)?;
        let date = date.unwrap_or_else(|| self.today());
        self.policy().board(viewer.as_ref(), date, region)
    }

    /// Distinct regions among current members.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn regions(&self) -> Result<Vec<Region>> {
        self.directory().regions()
    }

    /// Counts and date range of stored data.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the database cannot be read.
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }

    /// Delete all members and entries.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn reset(&self) -> Result<ResetSummary> {
        let summary = self.storage.reset()?;
        info!("Store reset at {}", self.storage.path().display());
        Ok(summary)
    }

    fn resolve_viewer(&self, identity: Option<&Identity>) -> Result<Option<Member>> {
        identity.map(|id| self.authenticate(id)).transpose()
    }
}
