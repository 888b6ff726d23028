mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, FocusConfig, InsightsConfig, UserConfig};
pub use database::{Database, UserRecord};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// Resolution order:
/// 1. `TASKFORGE_DATA_DIR`, used verbatim
/// 2. `~/.config/taskforge-dev/` when `TASKFORGE_ENV=dev`
/// 3. `~/.config/taskforge/`
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TASKFORGE_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TASKFORGE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("taskforge-dev")
            } else {
                base_dir.join("taskforge")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
