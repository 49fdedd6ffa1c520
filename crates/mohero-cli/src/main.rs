use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "mohero-cli", version, about = "MoHero daily workout CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account and session management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Browse and select training programs
    Program {
        #[command(subcommand)]
        action: commands::program::ProgramAction,
    },
    /// Today's exercises
    Ritual {
        #[command(subcommand)]
        action: commands::ritual::RitualAction,
    },
    /// Progress in the active program
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Load the dashboard (runs the daily roll-over check)
    Dashboard,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MOHERO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Program { action } => commands::program::run(action),
        Commands::Ritual { action } => commands::ritual::run(action),
        Commands::Progress { action } => commands::progress::run(action),
        Commands::Dashboard => commands::dashboard::run(),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
