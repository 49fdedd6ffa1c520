//! Calendar roll-over detection.
//!
//! Users often come back the next day without tapping "complete". On load the
//! evaluator compares today's calendar date with the last time the user was
//! seen and reports whether the current day should move forward. Dates are
//! compared on (year, month, day) in the caller's offset, not by elapsed hours.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ritual::DailyRitual;
use crate::storage::Database;

/// Where last-seen timestamps are kept, per user.
pub trait LastSeenStore {
    fn last_seen(&self, user_id: &str) -> Result<Option<DateTime<FixedOffset>>>;
    fn set_last_seen(&self, user_id: &str, at: DateTime<FixedOffset>) -> Result<()>;
}

fn last_seen_key(user_id: &str) -> String {
    format!("last_seen:{user_id}")
}

impl LastSeenStore for Database {
    fn last_seen(&self, user_id: &str) -> Result<Option<DateTime<FixedOffset>>> {
        let Some(raw) = self.kv_get(&last_seen_key(user_id))? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Ok(Some(at)),
            Err(e) => {
                tracing::warn!(user = user_id, error = %e, "discarding unreadable last-seen timestamp");
                Ok(None)
            }
        }
    }

    fn set_last_seen(&self, user_id: &str, at: DateTime<FixedOffset>) -> Result<()> {
        self.kv_set(&last_seen_key(user_id), &at.to_rfc3339())
    }
}

/// True when `now` falls on a different calendar date than `last_seen`,
/// judged in `now`'s offset.
pub fn is_new_calendar_day(last_seen: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    last_seen.with_timezone(&now.timezone()).date_naive() != now.date_naive()
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The stored day should roll forward.
    pub should_advance: bool,
    /// Every exercise of the loaded day was done. Informational only: the
    /// advance decision does not depend on it.
    pub all_exercises_completed: bool,
    /// No last-seen timestamp existed before this evaluation.
    pub first_visit: bool,
}

/// Runs the roll-over check at most once per instance (one page load).
#[derive(Debug, Default)]
pub struct DayProgressionEvaluator {
    checked: bool,
}

impl DayProgressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_checked(&self) -> bool {
        self.checked
    }

    /// Compare `now` with the user's last-seen timestamp and record `now` as
    /// the new last-seen value.
    ///
    /// Returns `None` when this instance already evaluated successfully.
    pub fn evaluate<S: LastSeenStore + ?Sized>(
        &mut self,
        store: &S,
        user_id: &str,
        now: DateTime<FixedOffset>,
        ritual: Option<&DailyRitual>,
    ) -> Result<Option<Evaluation>> {
        if self.checked {
            return Ok(None);
        }

        let previous = store.last_seen(user_id)?;
        let should_advance = previous.is_some_and(|last| is_new_calendar_day(last, now));
        let all_exercises_completed = ritual.is_some_and(DailyRitual::all_complete);

        store.set_last_seen(user_id, now)?;
        // Only a recorded check counts; a failed one may be retried.
        self.checked = true;

        tracing::debug!(
            user = user_id,
            should_advance,
            all_exercises_completed,
            first_visit = previous.is_none(),
            "evaluated day progression"
        );

        Ok(Some(Evaluation {
            should_advance,
            all_exercises_completed,
            first_visit: previous.is_none(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryStore {
        value: RefCell<Option<DateTime<FixedOffset>>>,
        writes: RefCell<usize>,
        fail_next_write: RefCell<bool>,
    }

    impl LastSeenStore for MemoryStore {
        fn last_seen(&self, _user_id: &str) -> Result<Option<DateTime<FixedOffset>>> {
            Ok(*self.value.borrow())
        }

        fn set_last_seen(&self, _user_id: &str, at: DateTime<FixedOffset>) -> Result<()> {
            if self.fail_next_write.replace(false) {
                return Err(crate::error::CoreError::Custom("disk full".to_string()));
            }
            *self.value.borrow_mut() = Some(at);
            *self.writes.borrow_mut() += 1;
            Ok(())
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, day, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn failed_write_leaves_evaluation_available() {
        let store = MemoryStore::default();
        *store.value.borrow_mut() = Some(at(9, 20));
        *store.fail_next_write.borrow_mut() = true;

        let mut evaluator = DayProgressionEvaluator::new();
        assert!(evaluator.evaluate(&store, "u", at(10, 8), None).is_err());
        assert!(!evaluator.has_checked());

        let eval = evaluator.evaluate(&store, "u", at(10, 8), None).unwrap().unwrap();
        assert!(eval.should_advance);
        assert!(evaluator.has_checked());
        assert_eq!(*store.value.borrow(), Some(at(10, 8)));
    }

    #[test]
    fn first_visit_does_not_advance() {
        let store = MemoryStore::default();
        let eval = DayProgressionEvaluator::new()
            .evaluate(&store, "u", at(10, 9), None)
            .unwrap()
            .unwrap();
        assert!(!eval.should_advance);
        assert!(eval.first_visit);
        assert_eq!(*store.value.borrow(), Some(at(10, 9)));
    }

    #[test]
    fn yesterday_then_today_advances() {
        let store = MemoryStore::default();
        *store.value.borrow_mut() = Some(at(9, 23));
        let eval = DayProgressionEvaluator::new()
            .evaluate(&store, "u", at(10, 0), None)
            .unwrap()
            .unwrap();
        assert!(eval.should_advance);
        assert_eq!(*store.writes.borrow(), 1);
    }

    #[test]
    fn same_day_does_not_advance() {
        let store = MemoryStore::default();
        *store.value.borrow_mut() = Some(at(10, 0));
        let eval = DayProgressionEvaluator::new()
            .evaluate(&store, "u", at(10, 23), None)
            .unwrap()
            .unwrap();
        assert!(!eval.should_advance);
    }

    #[test]
    fn calendar_date_not_elapsed_hours() {
        // Less than an hour apart, but across midnight.
        assert!(is_new_calendar_day(at(9, 23), at(9, 23) + Duration::minutes(61)));
        // Almost a full day apart, same date.
        assert!(!is_new_calendar_day(at(10, 0), at(10, 23)));
    }

    #[test]
    fn compares_in_callers_offset() {
        // 23:30 UTC on the 9th is 01:30 on the 10th at +02:00.
        let utc_evening = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 9, 23, 30, 0)
            .unwrap();
        assert!(!is_new_calendar_day(utc_evening, at(10, 8)));
    }

    #[test]
    fn runs_once_per_instance() {
        let store = MemoryStore::default();
        *store.value.borrow_mut() = Some(at(9, 12));
        let mut evaluator = DayProgressionEvaluator::new();
        assert!(evaluator.evaluate(&store, "u", at(10, 8), None).unwrap().is_some());
        assert!(evaluator.has_checked());
        assert!(evaluator.evaluate(&store, "u", at(11, 8), None).unwrap().is_none());
        assert_eq!(*store.writes.borrow(), 1);
    }

    #[test]
    fn database_store_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.last_seen("u").unwrap().is_none());
        db.set_last_seen("u", at(10, 9)).unwrap();
        assert_eq!(db.last_seen("u").unwrap(), Some(at(10, 9)));
        db.kv_set("last_seen:u", "garbage").unwrap();
        assert!(db.last_seen("u").unwrap().is_none());
    }
}
