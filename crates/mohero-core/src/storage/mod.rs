mod account_db;
mod catalog_db;
mod config;
pub mod database;
pub mod migrations;
mod progress_db;

pub use account_db::{SessionRow, UserRow};
pub use config::{AuthConfig, CatalogConfig, Config, ProgressionConfig, SessionConfig};
pub use database::Database;
pub use progress_db::Profile;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `MOHERO_DATA_DIR` wins when set. Otherwise `~/.config/mohero`, or
/// `~/.config/mohero-dev` when `MOHERO_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("MOHERO_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("MOHERO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("mohero-dev")
            } else {
                base_dir.join("mohero")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
