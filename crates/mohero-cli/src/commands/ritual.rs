use chrono::Utc;
use clap::Subcommand;
use mohero_core::DailyRitual;

use super::{open_app, print_event, print_json, CliResult};

#[derive(Subcommand)]
pub enum RitualAction {
    /// Show the current day's exercises
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store an absolute value for an exercise
    Set { exercise_id: String, value: i64 },
    /// Add to (or, with a negative delta, subtract from) an exercise
    Add {
        exercise_id: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Mark the current day done
    Complete,
}

pub fn run(action: RitualAction) -> CliResult {
    let mut app = open_app()?;
    match action {
        RitualAction::Show { json } => {
            let ritual = app.current_ritual()?;
            if json {
                print_json(&ritual)
            } else {
                print_ritual(&ritual);
                Ok(())
            }
        }
        RitualAction::Set { exercise_id, value } => {
            print_event(&app.update_exercise(&exercise_id, value, Utc::now())?)
        }
        RitualAction::Add { exercise_id, delta } => {
            print_event(&app.add_to_exercise(&exercise_id, delta, Utc::now())?)
        }
        RitualAction::Complete => print_event(&app.complete_ritual(Utc::now())?),
    }
}

pub fn print_ritual(ritual: &DailyRitual) {
    println!("Day {}: {}", ritual.day, ritual.title);
    if let Some(description) = &ritual.description {
        println!("  {description}");
    }
    for ex in &ritual.exercises {
        let check = if ex.is_complete() { "x" } else { " " };
        println!(
            "  [{check}] {} {}/{} {}  ({})",
            ex.name,
            ex.completed_value,
            ex.target,
            ex.kind.unit(),
            ex.id
        );
    }
    if ritual.completed {
        println!("All exercises done.");
    }
}
