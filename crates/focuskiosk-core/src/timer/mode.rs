use serde::{Deserialize, Serialize};

/// Lower bound for a configurable work or break duration, in minutes.
pub const MIN_DURATION_MIN: u32 = 1;
/// Upper bound for a configurable work or break duration, in minutes.
pub const MAX_DURATION_MIN: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Work,
    /// Work countdown finished; waits for an explicit acknowledgment.
    Alarm,
    Break,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "WORK",
            Mode::Alarm => "ALARM",
            Mode::Break => "BREAK",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A work or break length in whole minutes, always within
/// [`MIN_DURATION_MIN`, `MAX_DURATION_MIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct DurationMinutes(u32);

impl DurationMinutes {
    /// Clamp any integer into the allowed range. Out-of-range input is never
    /// rejected.
    pub fn clamped(minutes: i64) -> Self {
        let clamped = minutes.clamp(MIN_DURATION_MIN as i64, MAX_DURATION_MIN as i64);
        Self(clamped as u32)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        u64::from(self.0) * 60
    }
}

impl From<i64> for DurationMinutes {
    fn from(minutes: i64) -> Self {
        Self::clamped(minutes)
    }
}

impl From<DurationMinutes> for u32 {
    fn from(d: DurationMinutes) -> Self {
        d.0
    }
}

impl std::fmt::Display for DurationMinutes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
