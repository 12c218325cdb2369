//! Presence tracking.
//!
//! Reduces the detector's per-frame face counts to a single `present` flag
//! and keeps the away counter the work countdown consults once per second.
//! There is no smoothing: one frame with zero faces flips `present` to false.
//! The 180-second away threshold in the timer absorbs short false negatives.
//!
//! The tracker runs no clock of its own. `record_away_second` is called by
//! the timer tick, `on_detection_result` by the detection feed at whatever
//! rate it produces frames.

use serde::{Deserialize, Serialize};

/// Continuous absence, in seconds, after which a work session is abandoned.
pub const AWAY_RESET_THRESHOLD_SECS: u32 = 180;

/// Whether detection results are currently flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    Live,
    /// Detector or camera failed. Presence is pinned to a fallback value.
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceTracker {
    present: bool,
    away_seconds: u32,
    feed: FeedStatus,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceTracker {
    /// Nobody is assumed present until the first detection result arrives.
    pub fn new() -> Self {
        Self {
            present: false,
            away_seconds: 0,
            feed: FeedStatus::Live,
        }
    }

    pub fn present(&self) -> bool {
        self.present
    }

    pub fn away_seconds(&self) -> u32 {
        self.away_seconds
    }

    pub fn feed(&self) -> FeedStatus {
        self.feed
    }

    /// Apply one detection result. Returns the new value of `present` when it
    /// changed, `None` otherwise. Ignored while the feed is unavailable.
    pub fn on_detection_result(&mut self, face_count: u32) -> Option<bool> {
        if self.feed == FeedStatus::Unavailable {
            return None;
        }
        self.set_present(face_count > 0)
    }

    /// Count one absent second. Returns `true` when the away threshold was
    /// reached, in which case the counter is already back at zero.
    pub fn record_away_second(&mut self) -> bool {
        self.away_seconds += 1;
        if self.away_seconds >= AWAY_RESET_THRESHOLD_SECS {
            self.away_seconds = 0;
            true
        } else {
            false
        }
    }

    /// Detector or camera lost. Presence is pinned to `fallback`.
    pub fn mark_unavailable(&mut self, fallback: bool) -> Option<bool> {
        self.feed = FeedStatus::Unavailable;
        self.set_present(fallback)
    }

    /// Detector came back; the next result decides presence again.
    pub fn mark_live(&mut self) {
        self.feed = FeedStatus::Live;
    }

    fn set_present(&mut self, present: bool) -> Option<bool> {
        if present {
            self.away_seconds = 0;
        }
        if present == self.present {
            return None;
        }
        self.present = present;
        Some(present)
    }
}
