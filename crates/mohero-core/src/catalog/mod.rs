//! Program catalog.
//!
//! Programs are immutable reference data: they are created by the built-in
//! seed or by importing a JSON document, and are never mutated by users.

mod seed;

pub use seed::builtin_programs;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::ritual::ExerciseKind;

/// Program difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> std::result::Result<Self, ValidationError> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ValidationError::InvalidValue {
                field: "difficulty".to_string(),
                message: format!("expected easy, medium or hard, got '{other}'"),
            }),
        }
    }
}

/// A named, fixed-duration sequence of daily rituals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_days: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub focus_tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Exercise as authored in a program definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    /// Stable id; generated from program, day and position when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: ExerciseKind,
    pub target: u32,
    #[serde(default)]
    pub media_refs: Vec<String>,
}

/// One day of a program definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDefinition {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub exercises: Vec<ExerciseDefinition>,
}

/// A program together with its per-day exercise definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDefinition {
    #[serde(flatten)]
    pub program: Program,
    #[serde(default)]
    pub days: Vec<DayDefinition>,
}

impl ProgramDefinition {
    /// Check the structural invariants of a definition before it is stored.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let p = &self.program;
        if p.id.trim().is_empty() {
            return Err(ValidationError::Required("id"));
        }
        if p.name.trim().is_empty() {
            return Err(ValidationError::Required("name"));
        }
        if p.duration_days == 0 {
            return Err(invalid("duration_days", "must be at least 1"));
        }

        let mut seen = std::collections::HashSet::new();
        for day in &self.days {
            if day.day == 0 || day.day > p.duration_days {
                return Err(invalid(
                    "day",
                    format!("day {} outside 1..={}", day.day, p.duration_days),
                ));
            }
            if !seen.insert(day.day) {
                return Err(invalid("day", format!("day {} defined twice", day.day)));
            }
            if let Some(ex) = day.exercises.iter().find(|e| e.target == 0) {
                return Err(invalid(
                    "target",
                    format!("exercise '{}' on day {} has a zero target", ex.name, day.day),
                ));
            }
        }
        Ok(())
    }

    /// Exercise id for the exercise at `position` on `day`.
    pub fn exercise_id(&self, day: &DayDefinition, position: usize) -> String {
        day.exercises
            .get(position)
            .and_then(|e| e.id.clone())
            .unwrap_or_else(|| format!("{}-d{:02}-{}", self.program.id, day.day, position + 1))
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Parse a catalog import document: either a single program definition or an
/// array of them. Every definition is validated.
pub fn parse_definitions(json: &str) -> Result<Vec<ProgramDefinition>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let defs: Vec<ProgramDefinition> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    for def in &defs {
        def.validate()?;
    }
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "mini",
        "name": "Mini",
        "duration_days": 2,
        "difficulty": "easy",
        "focus_tags": ["core"],
        "days": [
            { "day": 1, "title": "Start", "exercises": [
                { "name": "Plank", "kind": "duration", "target": 30 },
                { "id": "custom", "name": "Squats", "kind": "reps", "target": 15 }
            ] }
        ]
    }"#;

    #[test]
    fn parses_single_definition() {
        let defs = parse_definitions(SAMPLE).unwrap();
        assert_eq!(defs.len(), 1);
        let def = &defs[0];
        assert_eq!(def.program.difficulty, Difficulty::Easy);
        assert_eq!(def.exercise_id(&def.days[0], 0), "mini-d01-1");
        assert_eq!(def.exercise_id(&def.days[0], 1), "custom");
    }

    #[test]
    fn parses_array() {
        let doc = format!("[{SAMPLE}]");
        assert_eq!(parse_definitions(&doc).unwrap().len(), 1);
    }

    #[test]
    fn rejects_day_past_duration() {
        let mut def = parse_definitions(SAMPLE).unwrap().remove(0);
        def.days[0].day = 3;
        assert!(def.validate().is_err());
    }

    #[test]
    fn rejects_zero_duration() {
        let mut def = parse_definitions(SAMPLE).unwrap().remove(0);
        def.program.duration_days = 0;
        def.days.clear();
        assert!(def.validate().is_err());
    }

    #[test]
    fn difficulty_parse() {
        assert_eq!(Difficulty::parse("HARD").unwrap(), Difficulty::Hard);
        assert!(Difficulty::parse("extreme").is_err());
    }

    #[test]
    fn builtin_programs_are_valid() {
        let programs = builtin_programs();
        assert!(!programs.is_empty());
        for def in programs {
            def.validate().unwrap();
            assert_eq!(def.days.len() as u32, def.program.duration_days);
        }
    }
}
