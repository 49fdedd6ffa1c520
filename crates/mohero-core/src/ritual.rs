//! Daily ritual and exercise types.
//!
//! A ritual is the list of exercises a program assigns to one day. It is never
//! stored as such: it is rebuilt from the day's exercise definitions every
//! time it is read, with each exercise's `completed_value` hydrated from the
//! user's persisted progress records (0 when none exists).

use serde::{Deserialize, Serialize};

/// How an exercise target is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Target is a repetition count
    Reps,
    /// Target is a number of seconds
    Duration,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Reps => "reps",
            ExerciseKind::Duration => "duration",
        }
    }

    /// Parse the storage representation. Unknown values fall back to reps.
    pub fn parse(s: &str) -> Self {
        match s {
            "duration" | "time" => ExerciseKind::Duration,
            _ => ExerciseKind::Reps,
        }
    }

    /// Unit label used when displaying a target.
    pub fn unit(&self) -> &'static str {
        match self {
            ExerciseKind::Reps => "reps",
            ExerciseKind::Duration => "s",
        }
    }
}

/// One exercise of a program day, with the current user's progress on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: ExerciseKind,
    pub target: u32,
    #[serde(default)]
    pub completed_value: u32,
    #[serde(default)]
    pub media_refs: Vec<String>,
    #[serde(default)]
    pub position: u32,
}

impl Exercise {
    pub fn is_complete(&self) -> bool {
        self.completed_value >= self.target
    }

    /// Units left before the target is reached.
    pub fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.completed_value)
    }
}

/// Clamp a requested completion value into `[0, target]`.
pub fn clamp_value(requested: i64, target: u32) -> u32 {
    requested.clamp(0, i64::from(target)) as u32
}

/// Value produced by the increment/decrement/custom-add controls:
/// `clamp(old + delta, 0, target)`.
pub fn apply_delta(old: u32, delta: i64, target: u32) -> u32 {
    clamp_value(i64::from(old).saturating_add(delta), target)
}

/// The exercises assigned to a given program day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRitual {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub exercises: Vec<Exercise>,
    pub completed: bool,
}

impl DailyRitual {
    /// Build a ritual, deriving the completed flag from its exercises.
    ///
    /// A day without exercises counts as complete (rest day).
    pub fn new(day: u32, title: String, description: Option<String>, exercises: Vec<Exercise>) -> Self {
        let completed = exercises.iter().all(Exercise::is_complete);
        Self {
            day,
            title,
            description,
            exercises,
            completed,
        }
    }

    pub fn all_complete(&self) -> bool {
        self.exercises.iter().all(Exercise::is_complete)
    }

    pub fn incomplete_count(&self) -> usize {
        self.exercises.iter().filter(|e| !e.is_complete()).count()
    }

    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }
}
