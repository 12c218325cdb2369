mod settings;

pub use settings::{
    MemorySettingsStore, SettingsRecord, SettingsStore, TomlSettingsStore, Typography,
    BREAK_TASK_PLACEHOLDER,
};
pub(crate) use settings::clamp_unit;

use std::path::PathBuf;

use crate::error::SettingsError;

/// Returns `~/.config/focuskiosk[-dev]/` based on FOCUSKIOSK_ENV.
///
/// Set FOCUSKIOSK_ENV=dev to use the development data directory, or
/// FOCUSKIOSK_CONFIG_DIR to use an explicit directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, SettingsError> {
    let dir = match std::env::var_os("FOCUSKIOSK_CONFIG_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSKIOSK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focuskiosk-dev")
            } else {
                base_dir.join("focuskiosk")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| SettingsError::DirUnavailable {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
