//! Built-in programs seeded into an empty catalog.

use super::{DayDefinition, Difficulty, ExerciseDefinition, Program, ProgramDefinition};
use crate::ritual::ExerciseKind;

/// Returns all built-in program definitions.
pub fn builtin_programs() -> Vec<ProgramDefinition> {
    vec![awakening(), core_forge(), legend_trial()]
}

struct Move {
    name: &'static str,
    kind: ExerciseKind,
    base: u32,
    step: u32,
}

const fn reps(name: &'static str, base: u32, step: u32) -> Move {
    Move {
        name,
        kind: ExerciseKind::Reps,
        base,
        step,
    }
}

const fn hold(name: &'static str, base: u32, step: u32) -> Move {
    Move {
        name,
        kind: ExerciseKind::Duration,
        base,
        step,
    }
}

/// Build a program whose targets grow by `step` per training day. Every
/// seventh day is a light recovery day with a single stretch.
fn progressive(program: Program, moves: &[Move]) -> ProgramDefinition {
    let days = (1..=program.duration_days)
        .map(|day| {
            if day % 7 == 0 {
                return DayDefinition {
                    day,
                    title: format!("Day {day} - Recovery"),
                    description: Some("Light mobility to let the body rebuild.".to_string()),
                    exercises: vec![ExerciseDefinition {
                        id: None,
                        name: "Full-body stretch".to_string(),
                        description: None,
                        kind: ExerciseKind::Duration,
                        target: 120,
                        media_refs: Vec::new(),
                    }],
                };
            }

            let exercises = moves
                .iter()
                .map(|m| ExerciseDefinition {
                    id: None,
                    name: m.name.to_string(),
                    description: None,
                    kind: m.kind,
                    target: m.base + m.step * (day - 1),
                    media_refs: Vec::new(),
                })
                .collect();

            DayDefinition {
                day,
                title: format!("Day {day}"),
                description: None,
                exercises,
            }
        })
        .collect();

    ProgramDefinition { program, days }
}

fn awakening() -> ProgramDefinition {
    progressive(
        Program {
            id: "hero-awakening".to_string(),
            name: "Hero Awakening".to_string(),
            description: "A gentle first week to build the daily habit.".to_string(),
            duration_days: 7,
            difficulty: Difficulty::Easy,
            focus_tags: vec!["habit".to_string(), "mobility".to_string()],
            image: None,
        },
        &[
            reps("Squats", 10, 2),
            reps("Knee push-ups", 5, 1),
            hold("Plank", 20, 5),
        ],
    )
}

fn core_forge() -> ProgramDefinition {
    progressive(
        Program {
            id: "core-forge".to_string(),
            name: "Core Forge".to_string(),
            description: "Two weeks focused on trunk strength and stability.".to_string(),
            duration_days: 14,
            difficulty: Difficulty::Medium,
            focus_tags: vec!["core".to_string(), "strength".to_string()],
            image: None,
        },
        &[
            reps("Crunches", 15, 2),
            reps("Leg raises", 10, 1),
            hold("Plank", 40, 5),
            hold("Side plank", 20, 3),
        ],
    )
}

fn legend_trial() -> ProgramDefinition {
    progressive(
        Program {
            id: "legend-trial".to_string(),
            name: "Legend Trial".to_string(),
            description: "Three demanding weeks of full-body conditioning.".to_string(),
            duration_days: 21,
            difficulty: Difficulty::Hard,
            focus_tags: vec!["endurance".to_string(), "strength".to_string(), "cardio".to_string()],
            image: None,
        },
        &[
            reps("Burpees", 10, 1),
            reps("Push-ups", 20, 2),
            reps("Jump squats", 20, 2),
            hold("Wall sit", 45, 5),
        ],
    )
}
