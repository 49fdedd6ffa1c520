pub mod auth;
pub mod completions;
pub mod config;
pub mod dashboard;
pub mod program;
pub mod progress;
pub mod ritual;

use chrono::Utc;
use mohero_core::{Event, MoHero};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the app and resume the remembered session, if any.
pub fn open_app() -> Result<MoHero, Box<dyn std::error::Error>> {
    let mut app = MoHero::open()?;
    app.restore_session(Utc::now())?;
    Ok(app)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_event(event: &Event) -> CliResult {
    print_json(event)
}
