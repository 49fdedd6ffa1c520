//! User progress through a program.
//!
//! [`UserProgress`] transitions are pure functions returning a new value;
//! [`ProgressTracker`] loads the stored record, applies a transition and
//! persists the result, so callers only ever see state that was written.

mod evaluator;
mod tracker;

pub use evaluator::{is_new_calendar_day, DayProgressionEvaluator, Evaluation, LastSeenStore};
pub use tracker::{ProgressTracker, Selection};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Day that follows `current` in a program of `duration_days`, wrapping to 1
/// past the end.
pub fn next_day(current: u32, duration_days: u32) -> u32 {
    if current.saturating_add(1) > duration_days {
        1
    } else {
        current + 1
    }
}

/// Per-user progression state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub current_program_id: Option<String>,
    /// Always within `1..=duration_days` of the active program.
    pub current_day: u32,
    pub last_completed_day: Option<u32>,
    pub streak: u32,
    pub total_completed_days: u32,
    pub start_date: Option<DateTime<Utc>>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            current_program_id: None,
            current_day: 1,
            last_completed_day: None,
            streak: 0,
            total_completed_days: 0,
            start_date: None,
        }
    }
}

impl UserProgress {
    pub fn has_program(&self) -> bool {
        self.current_program_id.is_some()
    }

    /// True when `program_id` differs from an already active program.
    pub fn is_switching_to(&self, program_id: &str) -> bool {
        self.current_program_id
            .as_deref()
            .is_some_and(|current| current != program_id)
    }

    /// State after selecting `program_id` at `now`: back to day 1 with a fresh
    /// start date. Switching to a different program also forgets the last
    /// completed day, which referred to the old program.
    pub fn started(&self, program_id: &str, now: DateTime<Utc>) -> Self {
        let switching = self.is_switching_to(program_id);
        Self {
            current_program_id: Some(program_id.to_string()),
            current_day: 1,
            last_completed_day: if switching { None } else { self.last_completed_day },
            start_date: Some(now),
            ..self.clone()
        }
    }

    /// State after an explicit ritual completion.
    pub fn completed(&self, duration_days: u32) -> Self {
        Self {
            current_day: next_day(self.current_day, duration_days),
            last_completed_day: Some(self.current_day),
            streak: self.streak.saturating_add(1),
            total_completed_days: self.total_completed_days.saturating_add(1),
            ..self.clone()
        }
    }

    /// State after a calendar roll-over advance.
    ///
    /// Unlike [`UserProgress::completed`] this leaves `streak` untouched while
    /// still counting the day in `total_completed_days`. It is not clear the
    /// two paths are meant to differ; see DESIGN.md before changing either.
    pub fn rolled_over(&self, duration_days: u32) -> Self {
        Self {
            current_day: next_day(self.current_day, duration_days),
            last_completed_day: Some(self.current_day),
            total_completed_days: self.total_completed_days.saturating_add(1),
            ..self.clone()
        }
    }
}
