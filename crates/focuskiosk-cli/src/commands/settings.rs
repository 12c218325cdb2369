use clap::Subcommand;
use focuskiosk_core::{SettingsError, SettingsStore, TomlSettingsStore};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Get a setting
    Get {
        /// Dot-separated key (e.g. "work_duration", "typography.clock_size")
        key: String,
    },
    /// Set a setting. Numbers outside their range are clamped.
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// Print all settings as JSON
    List,
    /// Reset settings to defaults
    Reset,
    /// Print the settings file location
    Path,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = TomlSettingsStore::open_default()?;
    match action {
        SettingsAction::Get { key } => {
            let record = store.load()?;
            let value = record.get(&key).ok_or(SettingsError::UnknownKey(key))?;
            println!("{value}");
        }
        SettingsAction::Set { key, value } => {
            let mut record = store.load()?;
            record.set(&key, &value)?;
            store.save(&record)?;
            let stored = record.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        SettingsAction::List => {
            let record = store.load()?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        SettingsAction::Reset => {
            store.reset()?;
            store.load()?;
            println!("settings reset to defaults");
        }
        SettingsAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}
