//! Submission coordinator: validates a submission and upserts the entry.

use tracing::info;

use crate::clock::Clock;
use crate::entry::{Submission, SubmitOutcome};
use crate::error::{Error, Result};
use crate::storage::Storage;

/// Accepts standup submissions, enforcing one entry per member per day.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionCoordinator<'a> {
    storage: &'a Storage,
    clock: &'a dyn Clock,
}

impl<'a> SubmissionCoordinator<'a> {
    /// Create a coordinator over the given storage and clock.
    #[must_use]
    pub fn new(storage: &'a Storage, clock: &'a dyn Clock) -> Self {
        Self { storage, clock }
    }

    /// Record a submission.
    ///
    /// The first submission for a member and day creates the entry; later
    /// ones overwrite its bodies and keep its id and creation time. A missing
    /// date means the clock's current day.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemberNotFound`] if the member does not exist, or a
    /// storage error if the write fails.
    pub fn submit(&self, submission: &Submission) -> Result<SubmitOutcome> {
        let member_id = submission.member_id;
        if self.storage.get_member(member_id)?.is_none() {
            return Err(Error::MemberNotFound { id: member_id });
        }

        let date = submission.date.unwrap_or_else(|| self.clock.today());
        let (id, prior) = self.storage.upsert_standup(
            member_id,
            date,
            &submission.content(),
            self.clock.now(),
        )?;
        let (_, transition) = prior.on_submit();

        info!(
            "Standup {} for member {} on {}: {:?}",
            id, member_id, date, transition
        );
        Ok(SubmitOutcome::new(id, transition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::entry::Transition;
    use crate::member::{NewMember, Region};
    use chrono::{Duration, NaiveDate};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (Storage, i64) {
        let storage = Storage::open_in_memory().expect("failed to create test storage");
        let id = storage
            .insert_member(
                &NewMember::new("Ana", Region::London),
                chrono::Utc::now(),
            )
            .unwrap()
            .id;
        (storage, id)
    }

    #[test]
    fn test_first_submission_creates() {
        let (storage, ana) = setup();
        let clock = FixedClock::on(day(2024, 1, 10));
        let coordinator = SubmissionCoordinator::new(&storage, &clock);

        let outcome = coordinator
            .submit(&Submission::new(ana).on(day(2024, 1, 10)).today("Design review"))
            .unwrap();
        assert_eq!(outcome.id, 1);
        assert!(outcome.created);
        assert!(!outcome.updated);
    }

    #[test]
    fn test_resubmission_updates_same_entry() {
        let (storage, ana) = setup();
        let first_clock = FixedClock::on(day(2024, 1, 10));
        let later_clock = FixedClock::at(first_clock.now() + Duration::hours(3));

        let first = SubmissionCoordinator::new(&storage, &first_clock)
            .submit(&Submission::new(ana).today("Design review"))
            .unwrap();
        let second = SubmissionCoordinator::new(&storage, &later_clock)
            .submit(&Submission::new(ana).today("Design review v2"))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.transition(), Transition::Updated);
        assert_eq!(storage.count_standups().unwrap(), 1);

        let entry = storage
            .get_standup(ana, day(2024, 1, 10))
            .unwrap()
            .unwrap()
            .entry;
        assert_eq!(entry.today, "Design review v2");
        assert_eq!(entry.created_at, first_clock.now());
        assert_eq!(entry.updated_at, later_clock.now());
    }

    #[test]
    fn test_missing_date_defaults_to_today() {
        let (storage, ana) = setup();
        let clock = FixedClock::on(day(2024, 3, 1));
        let coordinator = SubmissionCoordinator::new(&storage, &clock);

        coordinator
            .submit(&Submission::new(ana).today("x"))
            .unwrap();
        assert!(storage.get_standup(ana, day(2024, 3, 1)).unwrap().is_some());
    }

    #[test]
    fn test_explicit_date_is_respected() {
        let (storage, ana) = setup();
        let clock = FixedClock::on(day(2024, 3, 1));
        let coordinator = SubmissionCoordinator::new(&storage, &clock);

        coordinator
            .submit(&Submission::new(ana).on(day(2024, 2, 28)))
            .unwrap();
        assert!(storage.get_standup(ana, day(2024, 2, 28)).unwrap().is_some());
        assert!(storage.get_standup(ana, day(2024, 3, 1)).unwrap().is_none());
    }

    #[test]
    fn test_unknown_member() {
        let (storage, _) = setup();
        let clock = FixedClock::on(day(2024, 1, 10));
        let coordinator = SubmissionCoordinator::new(&storage, &clock);

        let err = coordinator.submit(&Submission::new(77)).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(storage.count_standups().unwrap(), 0);
    }

    #[test]
    fn test_omitted_bodies_are_empty() {
        let (storage, ana) = setup();
        let clock = FixedClock::on(day(2024, 1, 10));
        let coordinator = SubmissionCoordinator::new(&storage, &clock);

        coordinator.submit(&Submission::new(ana)).unwrap();
        let entry = storage
            .get_standup(ana, day(2024, 1, 10))
            .unwrap()
            .unwrap()
            .entry;
        assert!(entry.is_blank());
    }

    #[test]
    fn test_many_submissions_leave_one_row() {
        let (storage, ana) = setup();
        let clock = FixedClock::on(day(2024, 1, 10));
        let coordinator = SubmissionCoordinator::new(&storage, &clock);

        for i in 0..10 {
            coordinator
                .submit(&Submission::new(ana).today(format!("revision {i}")))
                .unwrap();
        }
        assert_eq!(storage.count_standups().unwrap(), 1);
        let entry = storage
            .get_standup(ana, day(2024, 1, 10))
            .unwrap()
            .unwrap()
            .entry;
        assert_eq!(entry.today, "revision 9");
    }
}
