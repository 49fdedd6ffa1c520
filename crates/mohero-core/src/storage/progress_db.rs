//! Profile and per-exercise progress tables: `profiles`, `progression_exercice`.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::catalog_db::{conversion_err, row_to_exercise_with_progress, EXERCISE_COLUMNS};
use super::Database;
use crate::error::{CoreError, Result};
use crate::progress::UserProgress;
use crate::ritual::DailyRitual;

/// A user's profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub clan: Option<String>,
    pub progress: UserProgress,
}

impl Database {
    pub fn create_profile(&self, user_id: &str, name: &str, clan: Option<&str>) -> Result<()> {
        self.conn().execute(
            "INSERT INTO profiles (id, name, clan, progress, current_program_id, current_day)
             VALUES (?1, ?2, ?3, ?4, NULL, 1)",
            params![
                user_id,
                name,
                clan,
                serde_json::to_string(&UserProgress::default())?
            ],
        )?;
        Ok(())
    }

    pub fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let profile = self
            .conn()
            .query_row(
                "SELECT id, name, clan, progress, current_program_id, current_day
                 FROM profiles WHERE id = ?1",
                params![user_id],
                |row| {
                    let json: String = row.get(3)?;
                    let mut progress: UserProgress =
                        serde_json::from_str(&json).map_err(|e| conversion_err(3, e))?;
                    // The dedicated columns are authoritative for program and day.
                    progress.current_program_id = row.get(4)?;
                    progress.current_day = row.get::<_, u32>(5)?.max(1);
                    Ok(Profile {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        clan: row.get(2)?,
                        progress,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    /// Load a user's progress, failing if the profile does not exist.
    pub fn load_progress(&self, user_id: &str) -> Result<UserProgress> {
        self.profile(user_id)?
            .map(|p| p.progress)
            .ok_or_else(|| CoreError::not_found("profile", user_id))
    }

    /// Persist the whole progress record in a single statement.
    pub fn save_progress(&self, user_id: &str, progress: &UserProgress) -> Result<()> {
        write_progress(self.conn(), user_id, progress)
    }

    /// Delete every exercise record of the user and persist `progress`, in
    /// one transaction.
    pub fn reset_progress(&self, user_id: &str, progress: &UserProgress) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM progression_exercice WHERE user_id = ?1",
            params![user_id],
        )?;
        write_progress(&tx, user_id, progress)?;
        tx.commit()?;
        Ok(removed)
    }

    /// Delete the user's records on `program_id` and persist `progress`, in
    /// one transaction. Used when a program wraps back to day 1.
    pub fn start_new_cycle(&self, user_id: &str, program_id: &str, progress: &UserProgress) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM progression_exercice
             WHERE user_id = ?1 AND exercice_id IN (
                SELECT e.id FROM exercices e
                JOIN jours j ON j.id = e.jour_id
                WHERE j.programme_id = ?2
             )",
            params![user_id, program_id],
        )?;
        write_progress(&tx, user_id, progress)?;
        tx.commit()?;
        Ok(removed)
    }

    /// Insert or update the (user, exercise) progress record.
    pub fn upsert_exercise_progress(
        &self,
        user_id: &str,
        exercise_id: &str,
        value: u32,
        completed: bool,
        day: u32,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO progression_exercice
                (user_id, exercice_id, value_achieved, completed, day_number)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, exercice_id) DO UPDATE SET
                value_achieved = excluded.value_achieved,
                completed = excluded.completed,
                day_number = excluded.day_number",
            params![user_id, exercise_id, value, completed, day],
        )?;
        Ok(())
    }

    /// Number of exercise records stored for the user.
    pub fn exercise_record_count(&self, user_id: &str) -> Result<u64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM progression_exercice WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Compose the ritual of `program_id` for `day`: the day's exercise
    /// definitions joined with the user's records, missing records reading as 0.
    pub fn ritual(&self, user_id: &str, program_id: &str, day: u32) -> Result<DailyRitual> {
        let (title, description) = self
            .day_header(program_id, day)?
            .unwrap_or_else(|| (format!("Day {day}"), None));

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {EXERCISE_COLUMNS}, pe.value_achieved
             FROM exercices e
             JOIN jours j ON j.id = e.jour_id
             LEFT JOIN progression_exercice pe
                ON pe.exercice_id = e.id AND pe.user_id = ?1 AND pe.day_number = j.day_number
             WHERE j.programme_id = ?2 AND j.day_number = ?3
             ORDER BY e.ordering"
        ))?;
        let exercises = stmt
            .query_map(params![user_id, program_id, day], row_to_exercise_with_progress)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(DailyRitual::new(day, title, description, exercises))
    }
}

fn write_progress(conn: &rusqlite::Connection, user_id: &str, progress: &UserProgress) -> Result<()> {
    let updated = conn.execute(
        "UPDATE profiles SET progress = ?2, current_program_id = ?3, current_day = ?4
         WHERE id = ?1",
        params![
            user_id,
            serde_json::to_string(progress)?,
            progress.current_program_id,
            progress.current_day,
        ],
    )?;
    if updated == 0 {
        return Err(CoreError::not_found("profile", user_id));
    }
    Ok(())
}
