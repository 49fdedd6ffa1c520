//! # MoHero Core Library
//!
//! Core logic for MoHero, a gamified daily-workout tracker. Users sign in,
//! pick a training program of fixed duration and work through one ritual of
//! exercises per day. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Catalog**: immutable programs, days and exercise definitions
//! - **Progress**: per-user position in a program, exercise values and the
//!   calendar roll-over check run once per page load
//! - **Auth**: local accounts, sessions and a background refresher
//! - **App**: the [`MoHero`] facade, the typed [`AppStore`] and route guard
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`MoHero`]: entry point used by front ends
//! - [`ProgressTracker`]: reads and writes one user's progress
//! - [`DayProgressionEvaluator`]: decides whether the current day rolls forward
//! - [`Database`]: persistence
//! - [`Config`]: application configuration

pub mod app;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod events;
pub mod progress;
pub mod ritual;
pub mod storage;

pub use app::{AppState, AppStore, Dashboard, DashboardView, MoHero, Route};
pub use auth::{AuthState, LocalAuth, Session, SessionRefresher, SignUp};
pub use catalog::{Difficulty, Program, ProgramDefinition};
pub use error::{AuthError, ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use progress::{DayProgressionEvaluator, Evaluation, ProgressTracker, UserProgress};
pub use ritual::{DailyRitual, Exercise, ExerciseKind};
pub use storage::{Config, Database};
