use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Every observable change in the kiosk produces an Event.
/// The terminal UI renders them; `run --json` prints them line by line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PresenceChanged {
        present: bool,
        at: DateTime<Utc>,
    },
    /// Work countdown reached zero; the alarm loop is sounding.
    AlarmRaised {
        at: DateTime<Utc>,
    },
    BreakStarted {
        task: String,
        duration_min: u32,
        at: DateTime<Utc>,
    },
    /// Break finished; a fresh work countdown started.
    WorkResumed {
        duration_min: u32,
        at: DateTime<Utc>,
    },
    /// Nobody present for the away threshold; work countdown restarted.
    AwayReset {
        duration_min: u32,
        at: DateTime<Utc>,
    },
    /// A duration change restarted the running countdown.
    CountdownReset {
        mode: Mode,
        remaining: String,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        key: String,
        value: String,
        at: DateTime<Utc>,
    },
    SettingsReset {
        at: DateTime<Utc>,
    },
    DetectorReady {
        sensitivity: f32,
        at: DateTime<Utc>,
    },
    /// Detector could not start; presence is treated as absent.
    DetectorUnavailable {
        reason: String,
        at: DateTime<Utc>,
    },
    /// One-time message for the user.
    Notice {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        remaining: String,
        remaining_secs: u64,
        present: bool,
        away_seconds: u32,
        break_task: Option<String>,
        work_duration_min: u32,
        break_duration_min: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::PresenceChanged { .. } => "PresenceChanged",
            Event::AlarmRaised { .. } => "AlarmRaised",
            Event::BreakStarted { .. } => "BreakStarted",
            Event::WorkResumed { .. } => "WorkResumed",
            Event::AwayReset { .. } => "AwayReset",
            Event::CountdownReset { .. } => "CountdownReset",
            Event::SettingsChanged { .. } => "SettingsChanged",
            Event::SettingsReset { .. } => "SettingsReset",
            Event::DetectorReady { .. } => "DetectorReady",
            Event::DetectorUnavailable { .. } => "DetectorUnavailable",
            Event::Notice { .. } => "Notice",
            Event::StateSnapshot { .. } => "StateSnapshot",
        }
    }
}
