use serde::{Deserialize, Serialize};

use super::mode::DurationMinutes;

/// Countdown value as displayed: whole minutes plus 0..=59 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remaining {
    pub minutes: u32,
    pub seconds: u32,
}

impl Remaining {
    pub const ZERO: Remaining = Remaining {
        minutes: 0,
        seconds: 0,
    };

    /// A full countdown for the given duration (`n:00`).
    pub fn full(duration: DurationMinutes) -> Self {
        Self {
            minutes: duration.get(),
            seconds: 0,
        }
    }

    pub fn total_secs(&self) -> u64 {
        u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    /// Take one second off. Saturates at `00:00`.
    pub fn decrement(&mut self) {
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        }
    }
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}
