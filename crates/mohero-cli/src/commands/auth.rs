use chrono::Utc;
use clap::Subcommand;
use mohero_core::auth::SignUp;
use mohero_core::{Config, Database, Event, LocalAuth, Session, SessionRefresher};

use super::{open_app, print_event, print_json, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and sign in
    Signup {
        email: String,
        #[arg(long)]
        password: String,
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        clan: Option<String>,
    },
    /// Sign in to an existing account
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the session
    Logout,
    /// Show the current session and profile
    Status,
    /// Keep the session alive until interrupted
    Keepalive,
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::Signup {
            email,
            password,
            name,
            clan,
        } => {
            let mut app = open_app()?;
            let req = SignUp {
                email,
                password,
                name,
                clan,
            };
            print_event(&app.sign_up(&req, Utc::now())?)
        }
        AuthAction::Login { email, password } => {
            let mut app = open_app()?;
            print_event(&app.sign_in(&email, &password, Utc::now())?)
        }
        AuthAction::Logout => {
            let mut app = open_app()?;
            print_event(&app.sign_out(Utc::now())?)
        }
        AuthAction::Status => status(),
        AuthAction::Keepalive => keepalive(),
    }
}

fn status() -> CliResult {
    let app = open_app()?;
    let state = app.state();
    match state.auth.session() {
        Some(session) => {
            let profile = app.profile()?;
            print_json(&serde_json::json!({
                "signed_in": true,
                "email": session.email,
                "expires_at": session.expires_at,
                "profile": profile,
            }))
        }
        None => print_json(&serde_json::json!({ "signed_in": false })),
    }
}

/// Renew the session on the configured interval until Ctrl-C or until the
/// session can no longer be renewed.
fn keepalive() -> CliResult {
    let app = open_app()?;
    let session = app
        .state()
        .auth
        .session()
        .cloned()
        .ok_or("not signed in")?;
    let config = app.config().clone();
    drop(app);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(refresh_until_interrupted(session, config))
}

async fn refresh_until_interrupted(session: Session, config: Config) -> CliResult {
    let period = config.refresh_interval();
    // The refresher owns its own connection; `Database` is not shared
    // across threads.
    let db = Database::open()?;
    let token = session.token;
    let refresher = SessionRefresher::spawn(period, move || {
        LocalAuth::new(&db, &config).refresh_session(&token, Utc::now())
    });
    let mut updates = refresher.subscribe();
    eprintln!(
        "keeping session alive every {} min, Ctrl-C to stop",
        period.as_secs() / 60
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    return Err("session could no longer be refreshed".into());
                }
                let latest = updates.borrow_and_update().clone();
                if let Some(session) = latest {
                    print_event(&Event::SessionRefreshed {
                        user_id: session.user_id,
                        expires_at: session.expires_at,
                    })?;
                }
            }
        }
    }
    refresher.stop();
    Ok(())
}
