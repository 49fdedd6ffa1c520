//! Application state shared with front ends.
//!
//! A single typed store replaces ambient global state: writers go through
//! [`AppStore::dispatch`], readers take a snapshot or [`AppStore::subscribe`]
//! to be notified of every change.

use serde::Serialize;
use tokio::sync::watch;

use crate::auth::{AuthEvent, AuthState};
use crate::catalog::Program;
use crate::progress::UserProgress;

/// Cached view of the signed-in user's state. Storage is the source of
/// truth; this is only updated after a write has succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppState {
    pub auth: AuthState,
    pub progress: Option<UserProgress>,
    pub program: Option<Program>,
}

#[derive(Debug, Clone)]
pub enum AppAction {
    Auth(AuthEvent),
    /// Progress as last read from or written to storage.
    ProgressLoaded {
        program: Option<Program>,
        progress: UserProgress,
    },
}

impl AppState {
    pub fn apply(&mut self, action: AppAction) {
        match action {
            AppAction::Auth(event) => {
                let before = self.auth.user_id().map(str::to_owned);
                self.auth = std::mem::take(&mut self.auth).transition(event);
                if self.auth.user_id() != before.as_deref() {
                    self.progress = None;
                    self.program = None;
                }
            }
            AppAction::ProgressLoaded { program, progress } => {
                if self.auth.is_signed_in() {
                    self.program = program;
                    self.progress = Some(progress);
                }
            }
        }
    }

    pub fn has_active_program(&self) -> bool {
        self.progress.as_ref().is_some_and(UserProgress::has_program)
    }
}

/// Subscribe/notify store around [`AppState`].
#[derive(Debug)]
pub struct AppStore {
    tx: watch::Sender<AppState>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AppState::default());
        Self { tx }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.tx.borrow().clone()
    }

    pub fn dispatch(&self, action: AppAction) {
        self.tx.send_modify(|state| state.apply(action));
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use chrono::Utc;

    fn sign_in(user: &str) -> AppAction {
        AppAction::Auth(AuthEvent::SignedIn {
            session: Session {
                user_id: user.to_string(),
                email: format!("{user}@example.com"),
                token: "t".to_string(),
                expires_at: Utc::now(),
            },
        })
    }

    fn loaded() -> AppAction {
        AppAction::ProgressLoaded {
            program: None,
            progress: UserProgress {
                current_program_id: Some("p".to_string()),
                ..UserProgress::default()
            },
        }
    }

    #[test]
    fn progress_ignored_while_signed_out() {
        let store = AppStore::new();
        store.dispatch(loaded());
        assert!(store.state().progress.is_none());
    }

    #[test]
    fn sign_out_clears_cached_progress() {
        let store = AppStore::new();
        store.dispatch(sign_in("a"));
        store.dispatch(loaded());
        assert!(store.state().has_active_program());
        store.dispatch(AppAction::Auth(AuthEvent::SignedOut));
        assert!(store.state().progress.is_none());
    }

    #[test]
    fn switching_user_clears_cached_progress() {
        let store = AppStore::new();
        store.dispatch(sign_in("a"));
        store.dispatch(loaded());
        store.dispatch(sign_in("b"));
        assert!(store.state().progress.is_none());
        assert_eq!(store.state().auth.user_id(), Some("b"));
    }

    #[test]
    fn subscribers_are_notified() {
        let store = AppStore::new();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());
        store.dispatch(sign_in("a"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().auth.is_signed_in());
    }
}
