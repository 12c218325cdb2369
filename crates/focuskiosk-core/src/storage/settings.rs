//! TOML-based kiosk settings.
//!
//! Stores the user's preferences:
//! - Alarm tone and volume
//! - Face detector sensitivity
//! - Work and break durations
//! - Display typography
//! - Break task suggestions
//!
//! Settings are stored at `~/.config/focuskiosk/settings.toml`. Missing keys
//! and keys holding a value of the wrong type fall back to defaults, and
//! out-of-range numbers are clamped on load; there is no versioning or
//! migration.

use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::data_dir;
use crate::audio::ToneShape;
use crate::error::SettingsError;
use crate::timer::DurationMinutes;

/// Shown when the break task list is empty.
pub const BREAK_TASK_PLACEHOLDER: &str = "RELAX";

/// Font and size settings for the kiosk display. Sizes are in viewport
/// percent, spacings in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_clock_size")]
    pub clock_size: i32,
    #[serde(default)]
    pub clock_spacing: i32,
    #[serde(default = "default_seconds_size")]
    pub seconds_size: i32,
    #[serde(default)]
    pub seconds_spacing: i32,
    #[serde(default = "default_small_size")]
    pub date_size: i32,
    #[serde(default)]
    pub date_spacing: i32,
    #[serde(default = "default_small_size")]
    pub timer_size: i32,
    #[serde(default)]
    pub timer_spacing: i32,
}

/// Everything the kiosk persists.
///
/// Serialized to/from TOML at `~/.config/focuskiosk/settings.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    #[serde(default)]
    pub tone: ToneShape,
    /// 0.0 ..= 1.0
    #[serde(default = "default_volume")]
    pub volume: f32,
    /// Minimum detector confidence, 0.0 ..= 1.0.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_work_duration")]
    pub work_duration: DurationMinutes,
    #[serde(default = "default_break_duration")]
    pub break_duration: DurationMinutes,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default = "default_break_tasks")]
    pub break_tasks: Vec<String>,
}

// Default functions
fn default_font_family() -> String {
    "'Share Tech Mono', monospace".into()
}
fn default_clock_size() -> i32 {
    30
}
fn default_seconds_size() -> i32 {
    8
}
fn default_small_size() -> i32 {
    5
}
fn default_volume() -> f32 {
    0.3
}
fn default_sensitivity() -> f32 {
    0.5
}
fn default_work_duration() -> DurationMinutes {
    DurationMinutes::clamped(25)
}
fn default_break_duration() -> DurationMinutes {
    DurationMinutes::clamped(5)
}
fn default_break_tasks() -> Vec<String> {
    vec!["Deep Breath".into(), "Stretch".into(), "Drink Water".into()]
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            clock_size: default_clock_size(),
            clock_spacing: 0,
            seconds_size: default_seconds_size(),
            seconds_spacing: 0,
            date_size: default_small_size(),
            date_spacing: 0,
            timer_size: default_small_size(),
            timer_spacing: 0,
        }
    }
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            tone: ToneShape::default(),
            volume: default_volume(),
            sensitivity: default_sensitivity(),
            work_duration: default_work_duration(),
            break_duration: default_break_duration(),
            typography: Typography::default(),
            break_tasks: default_break_tasks(),
        }
    }
}

impl SettingsRecord {
    /// Clamp unit-interval fields and drop blank tasks.
    pub fn normalized(mut self) -> Self {
        self.volume = clamp_unit(self.volume);
        self.sensitivity = clamp_unit(self.sensitivity);
        self.break_tasks.retain(|t| !t.trim().is_empty());
        self
    }

    /// Parse a settings file one key at a time. A key whose value does not
    /// fit its field is dropped so it falls back to the default, and its
    /// dotted name is returned alongside the record. Only TOML syntax errors
    /// fail.
    pub fn from_toml_lenient(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let file: toml::Table = content.parse()?;
        let mut accepted = toml::Table::new();
        let mut rejected = Vec::new();

        for (key, value) in file {
            match value {
                toml::Value::Table(inner) => {
                    for (sub, value) in inner {
                        let mut candidate = accepted.clone();
                        let section = candidate
                            .entry(key.clone())
                            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
                        if let toml::Value::Table(section) = section {
                            section.insert(sub.clone(), value);
                        }
                        if Self::fits(&candidate) {
                            accepted = candidate;
                        } else {
                            rejected.push(format!("{key}.{sub}"));
                        }
                    }
                }
                value => {
                    let mut candidate = accepted.clone();
                    candidate.insert(key.clone(), value);
                    if Self::fits(&candidate) {
                        accepted = candidate;
                    } else {
                        rejected.push(key);
                    }
                }
            }
        }

        let record: Self = toml::Value::Table(accepted).try_into()?;
        Ok((record.normalized(), rejected))
    }

    fn fits(table: &toml::Table) -> bool {
        toml::Value::Table(table.clone()).try_into::<Self>().is_ok()
    }

    /// Uniformly random break task, or [`BREAK_TASK_PLACEHOLDER`] when there
    /// are none.
    pub fn pick_break_task<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.break_tasks
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| BREAK_TASK_PLACEHOLDER.to_string())
    }

    /// Append a trimmed task. Blank input is ignored; returns whether a task
    /// was added.
    pub fn add_break_task(&mut self, task: &str) -> bool {
        let task = task.trim();
        if task.is_empty() {
            return false;
        }
        self.break_tasks.push(task.to_string());
        true
    }

    pub fn remove_break_task(&mut self, index: usize) -> Result<String, SettingsError> {
        if index >= self.break_tasks.len() {
            return Err(SettingsError::NoSuchTask {
                index,
                len: self.break_tasks.len(),
            });
        }
        Ok(self.break_tasks.remove(index))
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), SettingsError> {
        let unknown = || SettingsError::UnknownKey(key.to_string());
        let invalid = |message: String| SettingsError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.trim().parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.trim().parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Get a value as string by dot-separated key, e.g. `typography.clock_size`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Numbers are clamped into their
    /// allowed ranges rather than rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| SettingsError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: SettingsRecord =
            serde_json::from_value(json).map_err(|e| SettingsError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        *self = updated.normalized();
        Ok(())
    }
}

/// Clamp into 0..=1. NaN becomes 0.
pub(crate) fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Durable key/value record the kiosk reads at startup and writes on every
/// change.
pub trait SettingsStore {
    fn load(&mut self) -> Result<SettingsRecord, SettingsError>;
    fn save(&mut self, record: &SettingsRecord) -> Result<(), SettingsError>;
    /// Forget everything; the next `load` returns defaults.
    fn reset(&mut self) -> Result<(), SettingsError>;
}

/// Settings file on disk.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.toml` in the per-user data directory.
    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(data_dir()?.join("settings.toml")))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    /// Load from disk, writing defaults first if the file does not exist.
    fn load(&mut self) -> Result<SettingsRecord, SettingsError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let (record, rejected) = SettingsRecord::from_toml_lenient(&content).map_err(|e| {
                    SettingsError::LoadFailed {
                        path: self.path.clone(),
                        message: e.to_string(),
                    }
                })?;
                for key in rejected {
                    warn!(path = %self.path.display(), key = %key, "ignoring invalid setting, using default");
                }
                Ok(record)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let record = SettingsRecord::default();
                self.save(&record)?;
                Ok(record)
            }
            Err(e) => Err(SettingsError::LoadFailed {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn save(&mut self, record: &SettingsRecord) -> Result<(), SettingsError> {
        let save_failed = |message: String| SettingsError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let content = toml::to_string_pretty(record).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(&self.path, content).map_err(|e| save_failed(e.to_string()))
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SettingsError::SaveFailed {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// In-memory store for tests and `--ephemeral` runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    record: Option<SettingsRecord>,
    saves: usize,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: SettingsRecord) -> Self {
        Self {
            record: Some(record),
            saves: 0,
        }
    }

    pub fn saved(&self) -> Option<&SettingsRecord> {
        self.record.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&mut self) -> Result<SettingsRecord, SettingsError> {
        Ok(self.record.clone().unwrap_or_default().normalized())
    }

    fn save(&mut self, record: &SettingsRecord) -> Result<(), SettingsError> {
        self.record = Some(record.clone());
        self.saves += 1;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.record = None;
        Ok(())
    }
}
