//! Progress tracker operations for a single user.

use chrono::{DateTime, Utc};

use super::UserProgress;
use crate::catalog::Program;
use crate::error::{CoreError, Result, ValidationError};
use crate::ritual::{apply_delta, clamp_value, DailyRitual, Exercise};
use crate::storage::Database;

/// Result of a program selection.
#[derive(Debug, Clone)]
pub struct Selection {
    pub program: Program,
    pub progress: UserProgress,
    pub previous_program_id: Option<String>,
    /// Exercise records deleted because the user switched programs.
    pub records_cleared: usize,
}

/// Reads and writes one user's progress. Every operation persists before it
/// returns the new state; on error nothing is returned to cache.
pub struct ProgressTracker<'a> {
    db: &'a Database,
    user_id: &'a str,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(db: &'a Database, user_id: &'a str) -> Self {
        Self { db, user_id }
    }

    pub fn progress(&self) -> Result<UserProgress> {
        self.db.load_progress(self.user_id)
    }

    /// The active program and current progress, if a program is selected.
    pub fn active_program(&self) -> Result<Option<(Program, UserProgress)>> {
        let progress = self.progress()?;
        let Some(program_id) = progress.current_program_id.as_deref() else {
            return Ok(None);
        };
        let program = self
            .db
            .program(program_id)?
            .ok_or_else(|| CoreError::not_found("program", program_id))?;
        Ok(Some((program, progress)))
    }

    fn require_program(&self) -> Result<(Program, UserProgress)> {
        self.active_program()?.ok_or(CoreError::NoActiveProgram)
    }

    /// Make `program_id` the active program, restarting at day 1.
    ///
    /// Switching away from a different program deletes every exercise
    /// record of the user. That cannot be undone; callers confirm with the
    /// user first.
    pub fn select_program(&self, program_id: &str, now: DateTime<Utc>) -> Result<Selection> {
        let program = self
            .db
            .program(program_id)?
            .ok_or_else(|| CoreError::not_found("program", program_id))?;

        let current = self.progress()?;
        let next = current.started(program_id, now);

        let records_cleared = if current.is_switching_to(program_id) {
            self.db.reset_progress(self.user_id, &next)?
        } else {
            self.db.save_progress(self.user_id, &next)?;
            0
        };

        tracing::info!(
            user = self.user_id,
            program = program_id,
            previous = ?current.current_program_id,
            records_cleared,
            "program selected"
        );

        Ok(Selection {
            program,
            progress: next,
            previous_program_id: current.current_program_id,
            records_cleared,
        })
    }

    /// The exercise `exercise_id` as it appears in today's ritual.
    ///
    /// Exercises of other days or other programs are rejected so that no
    /// record is ever stamped with a day it does not belong to.
    fn todays_exercise(&self, exercise_id: &str) -> Result<(UserProgress, Exercise)> {
        let (program, progress) = self.require_program()?;
        let ritual = self.db.ritual(self.user_id, &program.id, progress.current_day)?;
        if let Some(exercise) = ritual.exercise(exercise_id) {
            let exercise = exercise.clone();
            return Ok((progress, exercise));
        }
        if self.db.exercise_definition(exercise_id)?.is_none() {
            return Err(CoreError::not_found("exercise", exercise_id));
        }
        Err(ValidationError::InvalidValue {
            field: "exercise_id".to_string(),
            message: format!(
                "'{exercise_id}' is not part of day {} of '{}'",
                progress.current_day, program.id
            ),
        }
        .into())
    }

    fn store_value(&self, day: u32, mut exercise: Exercise, value: u32) -> Result<Exercise> {
        exercise.completed_value = value;
        let completed = exercise.is_complete();
        self.db
            .upsert_exercise_progress(self.user_id, &exercise.id, value, completed, day)?;

        tracing::debug!(
            user = self.user_id,
            exercise = %exercise.id,
            day,
            value,
            completed,
            "exercise progress stored"
        );
        Ok(exercise)
    }

    /// Store `new_value`, clamped to `[0, target]`, as the user's value for
    /// an exercise of the current day. Does not move the current day.
    pub fn update_exercise_completion(&self, exercise_id: &str, new_value: i64) -> Result<Exercise> {
        let (progress, exercise) = self.todays_exercise(exercise_id)?;
        let value = clamp_value(new_value, exercise.target);
        self.store_value(progress.current_day, exercise, value)
    }

    /// Increment/decrement path: `clamp(stored + delta, 0, target)`.
    pub fn add_to_exercise(&self, exercise_id: &str, delta: i64) -> Result<Exercise> {
        let (progress, exercise) = self.todays_exercise(exercise_id)?;
        let value = apply_delta(exercise.completed_value, delta, exercise.target);
        self.store_value(progress.current_day, exercise, value)
    }

    /// Ritual of the active program's current day.
    pub fn current_ritual(&self) -> Result<DailyRitual> {
        let (program, progress) = self.require_program()?;
        self.db.ritual(self.user_id, &program.id, progress.current_day)
    }

    /// Mark the current day done and move to the next one.
    ///
    /// Fails with [`CoreError::RitualIncomplete`], leaving everything
    /// untouched, while any exercise is below its target.
    pub fn complete_ritual(&self) -> Result<UserProgress> {
        let (program, progress) = self.require_program()?;
        let ritual = self.db.ritual(self.user_id, &program.id, progress.current_day)?;
        if !ritual.all_complete() {
            return Err(CoreError::RitualIncomplete {
                day: progress.current_day,
                remaining: ritual.incomplete_count(),
            });
        }

        let next = progress.completed(program.duration_days);
        self.persist_next_day(&program, &progress, &next)?;
        tracing::info!(
            user = self.user_id,
            program = %program.id,
            day = progress.current_day,
            next_day = next.current_day,
            streak = next.streak,
            "ritual completed"
        );
        Ok(next)
    }

    /// Calendar roll-over advance. Counts the day but not the streak.
    pub fn advance_day(&self) -> Result<UserProgress> {
        let (program, progress) = self.require_program()?;
        let next = progress.rolled_over(program.duration_days);
        self.persist_next_day(&program, &progress, &next)?;
        tracing::info!(
            user = self.user_id,
            program = %program.id,
            from = progress.current_day,
            to = next.current_day,
            "day rolled over"
        );
        Ok(next)
    }

    /// Save the day change. Leaving the last day starts a new cycle, so the
    /// program's exercise records are cleared in the same transaction.
    fn persist_next_day(&self, program: &Program, current: &UserProgress, next: &UserProgress) -> Result<()> {
        if current.current_day < program.duration_days {
            return self.db.save_progress(self.user_id, next);
        }
        let cleared = self.db.start_new_cycle(self.user_id, &program.id, next)?;
        tracing::info!(
            user = self.user_id,
            program = %program.id,
            records_cleared = cleared,
            "program cycle restarted"
        );
        Ok(())
    }
}
