//! Member directory: adding, listing and authenticating members.
//!
//! Credentials are opaque secrets. Only a BLAKE3 digest is stored, derived
//! in key-derivation mode with the member id mixed in, so equal secrets on
//! different members produce different digests.

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::member::{Member, NewMember, Region};
use crate::storage::Storage;

/// Default minimum length of a credential, in characters.
pub const DEFAULT_MIN_CREDENTIAL_LENGTH: usize = 4;

/// Domain-separation context for credential digests.
const CREDENTIAL_CONTEXT: &str = "standup 2024-01 member credential v1";

/// Operations on the member directory.
#[derive(Debug, Clone, Copy)]
pub struct MemberDirectory<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
    min_credential_length: usize,
}

impl<'a> MemberDirectory<'a> {
    /// Create a directory over the given storage.
    #[must_use]
    pub fn new(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self {
            storage,
            clock,
            min_credential_length: DEFAULT_MIN_CREDENTIAL_LENGTH,
        }
    }

    /// Use a different minimum credential length.
    #[must_use]
    pub fn with_min_credential_length(mut self, min: usize) -> Self {
        self.min_credential_length = min;
        self
    }

    /// Members ordered by name, optionally only those in `region`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn list_members(&self, region: Option<Region>) -> Result<Vec<Member>> {
        self.storage.list_members(region)
    }

    /// Look up a member by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if no member has this id.
    pub fn get_member(&self, id: i64) -> Result<Member> {
        self.storage
            .get_member(id)?
            .ok_or(Error::MemberNotFound { id })
    }

    /// Add a member and return its id.
    ///
    /// The name is trimmed before storing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank name and
    /// [`Error::DuplicateMember`] if the name is already taken.
    pub fn add_member(&self, new: &NewMember) -> Result<i64> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("member name is required"));
        }

        let new = NewMember {
            name: name.to_string(),
            ..new.clone()
        };
        let member = self.storage.insert_member(&new, self.clock.now())?;
        info!(
            "Added member {} ({}, {}) with id {}",
            member.name, member.region, member.role, member.id
        );
        Ok(member.id)
    }

    /// Check a member's credential and return the member on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if the id is unknown and
    /// [`Error::InvalidCredential`] if the secret does not match or the
    /// member has no credential set.
    pub fn authenticate(&self, id: i64, credential: &str) -> Result<Member> {
        let (member, digest) = self
            .storage
            .member_credential(id)?
            .ok_or(Error::MemberNotFound { id })?;

        let matches = digest
            .as_deref()
            .and_then(|stored| blake3::Hash::from_hex(stored).ok())
            .is_some_and(|stored| stored == credential_digest(id, credential));

        if matches {
            debug!("Authenticated member {}", id);
            Ok(member)
        } else {
            warn!("Rejected credential for member {}", id);
            Err(Error::InvalidCredential { id })
        }
    }

    /// Replace a member's credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the credential is shorter than the
    /// minimum length and [`Error::MemberNotFound`] if the id is unknown.
    pub fn change_credential(&self, id: i64, new_credential: &str) -> Result<()> {
        let length = new_credential.chars().count();
        if length < self.min_credential_length {
            return Err(Error::invalid_input(format!(
                "credential must be at least {} characters long",
                self.min_credential_length
            )));
        }

        let digest = credential_digest(id, new_credential);
        if !self.storage.set_credential_digest(id, &digest.to_hex())? {
            return Err(Error::MemberNotFound { id });
        }
        info!("Changed credential for member {}", id);
        Ok(())
    }

    /// Distinct regions that currently have members.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be read.
    pub fn regions(&self) -> Result<Vec<Region>> {
        self.storage.member_regions()
    }
}

/// Digest a credential for the given member.
fn credential_digest(member_id: i64, credential: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(CREDENTIAL_CONTEXT);
    hasher.update(&member_id.to_le_bytes());
    hasher.update(credential.as_bytes());
    hasher.finalize()
}
