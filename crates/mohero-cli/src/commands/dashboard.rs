use chrono::Local;
use mohero_core::{DashboardView, Route};

use super::ritual::print_ritual;
use super::{open_app, CliResult};

/// Load the dashboard once, in the local timezone.
pub fn run() -> CliResult {
    let mut app = open_app()?;
    match app.load_dashboard(Local::now().fixed_offset())? {
        DashboardView::Redirect { to } => {
            let hint = match to {
                Route::Login => "sign in first: mohero-cli auth login <email>",
                Route::Programs => "pick a program: mohero-cli program select <id>",
                _ => "",
            };
            println!("redirect: {}", to.path());
            if !hint.is_empty() {
                println!("{hint}");
            }
        }
        DashboardView::Ready(dash) => {
            println!(
                "{} - day {}/{}  streak {}  total {}",
                dash.program.name,
                dash.progress.current_day,
                dash.program.duration_days,
                dash.progress.streak,
                dash.progress.total_completed_days
            );
            if let Some(event) = &dash.advanced {
                tracing::info!(?event, "day rolled over");
                println!("New day: moved on from yesterday's ritual.");
            }
            print_ritual(&dash.ritual);
        }
    }
    Ok(())
}
