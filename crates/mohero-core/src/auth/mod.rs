//! Authentication: accounts, sessions and the signed-in state machine.
//!
//! - [`LocalAuth`]: sign-up / sign-in / sign-out / refresh against the database
//! - [`AuthState`]: explicit transition function driven by [`AuthEvent`]s
//! - [`SessionRefresher`]: background timer renewing the session token

mod local;
mod refresh;
pub mod validation;

pub use local::LocalAuth;
pub use refresh::{SessionRefresher, DEFAULT_REFRESH_INTERVAL};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Sign-up request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub clan: Option<String>,
}

/// Session lifecycle events, as reported by the auth adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn { session: Session },
    TokenRefreshed { session: Session },
    SignedOut,
}

/// Whether someone is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn { session: Session },
}

impl AuthState {
    /// Apply an event.
    ///
    /// A refresh only replaces the session of the same user; it cannot sign
    /// anybody in.
    pub fn transition(self, event: AuthEvent) -> AuthState {
        match (self, event) {
            (_, AuthEvent::SignedIn { session }) => AuthState::SignedIn { session },
            (_, AuthEvent::SignedOut) => AuthState::SignedOut,
            (AuthState::SignedIn { session: current }, AuthEvent::TokenRefreshed { session }) => {
                if current.user_id == session.user_id {
                    AuthState::SignedIn { session }
                } else {
                    AuthState::SignedIn { session: current }
                }
            }
            (AuthState::SignedOut, AuthEvent::TokenRefreshed { .. }) => AuthState::SignedOut,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::SignedIn { session } => Some(session),
            AuthState::SignedOut => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session().map(|s| s.user_id.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }
}
