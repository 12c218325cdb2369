//! # focuskiosk Core Library
//!
//! Business logic for a presence-aware Pomodoro kiosk: a WORK / ALARM / BREAK
//! timer that only counts down while a face is in front of the camera, an
//! alarm scheduler that pre-renders its beeps against an audio clock, and
//! the persisted settings record. The `focuskiosk` binary is a thin driver
//! over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: a tick-driven state machine with no thread and no clock of
//!   its own; every input returns the side effects to perform
//! - **Presence**: reduces per-frame face counts to a present/away signal
//! - **Audio**: envelope scheduling behind an [`AudioBackend`] trait
//! - **Storage**: TOML settings record with dot-path get/set
//! - **Kiosk**: wires the above together and turns effects into [`Event`]s
//!
//! ## Key Components
//!
//! - [`TimerState`]: Pomodoro state machine
//! - [`PresenceTracker`]: presence and away counter
//! - [`AudioScheduler`]: alarm loop, end-of-break chime, preview tone
//! - [`Kiosk`]: coordinator exposing the command ports

pub mod audio;
pub mod clock;
pub mod detector;
pub mod error;
pub mod events;
pub mod kiosk;
pub mod presence;
pub mod storage;
pub mod timer;

pub use audio::{AudioBackend, AudioRequest, AudioScheduler, RecordingBackend, SilentBackend, ToneShape};
pub use clock::ClockFace;
pub use detector::{DetectorControl, ManualFeed};
pub use error::{AudioError, CoreError, DetectorError, SettingsError};
pub use events::Event;
pub use kiosk::Kiosk;
pub use presence::{PresenceTracker, AWAY_RESET_THRESHOLD_SECS};
pub use storage::{MemorySettingsStore, SettingsRecord, SettingsStore, TomlSettingsStore};
pub use timer::{DurationMinutes, Effect, Mode, Remaining, TimerState};
