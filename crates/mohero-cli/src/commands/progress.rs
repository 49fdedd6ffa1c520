use clap::Subcommand;

use super::{open_app, print_json, CliResult};

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Show progress in the active program
    Show,
}

pub fn run(action: ProgressAction) -> CliResult {
    match action {
        ProgressAction::Show => {
            let app = open_app()?;
            let progress = app.progress()?;
            let program = progress
                .current_program_id
                .as_deref()
                .map(|id| app.program(id))
                .transpose()?;
            print_json(&serde_json::json!({
                "program": program,
                "progress": progress,
            }))
        }
    }
}
