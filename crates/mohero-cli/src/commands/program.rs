use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;
use mohero_core::CoreError;

use super::{open_app, print_event, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProgramAction {
    /// List available programs
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one program
    Show { id: String },
    /// Make a program the active one
    Select {
        id: String,
        /// Confirm erasing progress when switching from another program
        #[arg(long)]
        yes: bool,
    },
    /// Import program definitions from a JSON file
    Import { file: PathBuf },
}

pub fn run(action: ProgramAction) -> CliResult {
    match action {
        ProgramAction::List { json } => list(json),
        ProgramAction::Show { id } => {
            let app = open_app()?;
            print_json(&app.program(&id)?)
        }
        ProgramAction::Select { id, yes } => {
            let mut app = open_app()?;
            match app.select_program(&id, yes, Utc::now()) {
                Ok(event) => print_event(&event),
                Err(CoreError::ConfirmationRequired { from, to }) => Err(format!(
                    "switching from '{from}' to '{to}' erases all exercise progress; rerun with --yes"
                )
                .into()),
                Err(e) => Err(e.into()),
            }
        }
        ProgramAction::Import { file } => {
            let app = open_app()?;
            let json = std::fs::read_to_string(&file)?;
            let ids = app.import_programs(&json)?;
            print_json(&serde_json::json!({ "imported": ids }))
        }
    }
}

fn list(json: bool) -> CliResult {
    let app = open_app()?;
    let programs = app.programs()?;
    if json {
        return print_json(&programs);
    }

    let active = app
        .state()
        .progress
        .and_then(|p| p.current_program_id);
    for program in programs {
        let marker = if active.as_deref() == Some(program.id.as_str()) {
            " [ACTIVE]"
        } else {
            ""
        };
        println!(
            "  {} - {} ({} days, {}){}",
            program.id,
            program.name,
            program.duration_days,
            program.difficulty.as_str(),
            marker
        );
        if !program.description.is_empty() {
            println!("    {}", program.description);
        }
    }
    Ok(())
}
