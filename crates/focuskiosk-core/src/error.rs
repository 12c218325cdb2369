//! Core error types for focuskiosk-core.
//!
//! Only settings persistence ever surfaces an error to the caller. Audio and
//! detector failures are reported through these types but are absorbed by the
//! kiosk so the one-second driver keeps ticking.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuskiosk-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings-related errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Audio-related errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Presence detector errors
    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings-store errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings directory could not be resolved or created
    #[error("Cannot prepare settings directory {path}: {source}")]
    DirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read the settings file
    #[error("Failed to load settings from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the settings file
    #[error("Failed to save settings to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key in `get`/`set`
    #[error("Unknown settings key: {0}")]
    UnknownKey(String),

    /// Value could not be parsed for the key's type
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Task index outside the break-task list
    #[error("No break task at index {index} (list has {len})")]
    NoSuchTask { index: usize, len: usize },
}

/// Audio backend errors. Never propagated past the scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// No output device or stream could be opened
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The voice handle does not refer to a live voice
    #[error("Unknown voice {0}")]
    UnknownVoice(u64),

    /// The voice was already stopped
    #[error("Voice {0} already stopped")]
    AlreadyStopped(u64),

    /// The voice was already disconnected
    #[error("Voice {0} already disconnected")]
    AlreadyDisconnected(u64),
}

/// Presence detector errors.
#[derive(Error, Debug)]
pub enum DetectorError {
    /// Detector backend could not be initialized
    #[error("Detector initialization failed: {0}")]
    InitFailed(String),

    /// Camera could not be acquired
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
