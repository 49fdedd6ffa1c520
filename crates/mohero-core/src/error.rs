//! Core error types for mohero-core.
//!
//! Errors are grouped the way callers react to them: validation problems are
//! caught before touching storage, storage and auth failures are surfaced to
//! the user and bubbled up, and not-found errors abort an operation without
//! changing any state.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for mohero-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication and session errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The day's ritual still has unfinished exercises
    #[error("Ritual for day {day} is not complete: {remaining} exercise(s) remaining")]
    RitualIncomplete { day: u32, remaining: usize },

    /// A destructive operation needs explicit confirmation from the user
    #[error("Switching from program '{from}' to '{to}' erases all exercise progress; confirmation required")]
    ConfirmationRequired { from: String, to: String },

    /// The user has not picked a program yet
    #[error("No program selected")]
    NoActiveProgram,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A uniqueness or foreign-key constraint rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Email/password pair did not match an account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Sign-up with an email that already has an account
    #[error("An account already exists for {0}")]
    EmailTaken(String),

    /// Operation requires a signed-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The session token is past its expiry
    #[error("Session expired")]
    SessionExpired,

    /// The password hasher failed or a stored hash could not be parsed
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Validation errors, raised before any storage call.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was left empty
    #[error("'{0}' is required")]
    Required(&'static str),

    /// Email is not of the form local@domain.tld
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Password shorter than the configured minimum
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) => match e.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                rusqlite::ErrorCode::ConstraintViolation => {
                    DatabaseError::Constraint(msg.clone().unwrap_or_else(|| e.to_string()))
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
