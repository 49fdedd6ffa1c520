//! Catalog tables: `programmes`, `jours`, `exercices`.

use rusqlite::{params, OptionalExtension, Row};

use super::Database;
use crate::catalog::{builtin_programs, Difficulty, Program, ProgramDefinition};
use crate::error::Result;
use crate::ritual::{Exercise, ExerciseKind};

pub(super) fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn row_to_program(row: &Row<'_>) -> rusqlite::Result<Program> {
    let difficulty: String = row.get(4)?;
    let tags: String = row.get(5)?;
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_days: row.get(3)?,
        difficulty: Difficulty::parse(&difficulty).map_err(|e| conversion_err(4, e))?,
        focus_tags: serde_json::from_str(&tags).map_err(|e| conversion_err(5, e))?,
        image: row.get(6)?,
    })
}

fn exercise_from_row(row: &Row<'_>, completed_value: u32) -> rusqlite::Result<Exercise> {
    let kind: String = row.get(3)?;
    let media: String = row.get(6)?;
    Ok(Exercise {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        kind: ExerciseKind::parse(&kind),
        target: row.get(4)?,
        position: row.get(5)?,
        media_refs: serde_json::from_str(&media).map_err(|e| conversion_err(6, e))?,
        completed_value,
    })
}

/// Maps the [`EXERCISE_COLUMNS`] of a definition-only query.
fn row_to_exercise(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    exercise_from_row(row, 0)
}

/// Maps [`EXERCISE_COLUMNS`] followed by the joined, nullable
/// `value_achieved`; no record reads as 0.
pub(super) fn row_to_exercise_with_progress(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    let completed_value: Option<u32> = row.get(7)?;
    exercise_from_row(row, completed_value.unwrap_or(0))
}

pub(super) const EXERCISE_COLUMNS: &str =
    "e.id, e.name, e.description, e.kind, e.target_value, e.ordering, e.media_urls";

const PROGRAM_COLUMNS: &str = "id, name, description, duration_days, difficulty, tags, image";

impl Database {
    /// Store a program definition, replacing any earlier definition with the
    /// same id. Re-importing replaces the day and exercise rows, which drops
    /// progress records pointing at them.
    pub fn import_program(&self, def: &ProgramDefinition) -> Result<()> {
        def.validate()?;
        let p = &def.program;
        let tx = self.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO programmes (id, name, description, duration_days, difficulty, tags, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                duration_days = excluded.duration_days,
                difficulty = excluded.difficulty,
                tags = excluded.tags,
                image = excluded.image",
            params![
                p.id,
                p.name,
                p.description,
                p.duration_days,
                p.difficulty.as_str(),
                serde_json::to_string(&p.focus_tags)?,
                p.image,
            ],
        )?;
        tx.execute("DELETE FROM jours WHERE programme_id = ?1", params![p.id])?;

        // Users already past the new last day move onto it.
        let clamped = tx.execute(
            "UPDATE profiles
             SET current_day = ?2, progress = json_set(progress, '$.current_day', ?2)
             WHERE current_program_id = ?1 AND current_day > ?2",
            params![p.id, p.duration_days],
        )?;
        if clamped > 0 {
            tracing::warn!(program = %p.id, users = clamped, "program shortened; current day clamped");
        }

        for day in &def.days {
            let jour_id = format!("{}-d{:02}", p.id, day.day);
            tx.execute(
                "INSERT INTO jours (id, programme_id, day_number, title, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![jour_id, p.id, day.day, day.title, day.description],
            )?;
            for (position, ex) in day.exercises.iter().enumerate() {
                tx.execute(
                    "INSERT INTO exercices
                        (id, jour_id, name, description, kind, target_value, ordering, media_urls)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        def.exercise_id(day, position),
                        jour_id,
                        ex.name,
                        ex.description,
                        ex.kind.as_str(),
                        ex.target,
                        position as u32,
                        serde_json::to_string(&ex.media_refs)?,
                    ],
                )?;
            }
        }

        tx.commit()?;
        tracing::info!(program = %p.id, days = def.days.len(), "imported program");
        Ok(())
    }

    /// Seed the built-in programs when the catalog is empty.
    ///
    /// Returns the number of programs inserted.
    pub fn seed_builtin_catalog(&self) -> Result<usize> {
        if self.program_count()? > 0 {
            return Ok(0);
        }
        let defs = builtin_programs();
        for def in &defs {
            self.import_program(def)?;
        }
        Ok(defs.len())
    }

    pub fn program_count(&self) -> Result<u64> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM programmes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// All programs, easiest first.
    pub fn list_programs(&self) -> Result<Vec<Program>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM programmes
             ORDER BY CASE difficulty WHEN 'easy' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END,
                      duration_days, name"
        ))?;
        let programs = stmt
            .query_map([], row_to_program)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(programs)
    }

    pub fn program(&self, id: &str) -> Result<Option<Program>> {
        let program = self
            .conn()
            .query_row(
                &format!("SELECT {PROGRAM_COLUMNS} FROM programmes WHERE id = ?1"),
                params![id],
                row_to_program,
            )
            .optional()?;
        Ok(program)
    }

    /// Exercise definition without any user progress attached.
    pub fn exercise_definition(&self, exercise_id: &str) -> Result<Option<Exercise>> {
        let exercise = self
            .conn()
            .query_row(
                &format!("SELECT {EXERCISE_COLUMNS} FROM exercices e WHERE e.id = ?1"),
                params![exercise_id],
                row_to_exercise,
            )
            .optional()?;
        Ok(exercise)
    }

    /// Title and description of a program day, if the day is defined.
    pub fn day_header(&self, program_id: &str, day: u32) -> Result<Option<(String, Option<String>)>> {
        let header = self
            .conn()
            .query_row(
                "SELECT title, description FROM jours WHERE programme_id = ?1 AND day_number = ?2",
                params![program_id, day],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(header)
    }
}
