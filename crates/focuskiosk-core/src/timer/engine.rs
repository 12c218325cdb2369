//! Pomodoro state machine.
//!
//! The timer has no thread and no clock. The caller drives it with one
//! `on_tick()` per second and forwards the acknowledge command; each call
//! mutates the state and returns the side effects the caller must carry out
//! (sound, task pick, display refresh).
//!
//! ## State Transitions
//!
//! ```text
//!          remaining hits 0           acknowledge()
//!   WORK ───────────────────► ALARM ───────────────► BREAK
//!    ▲  (only while present)                           │
//!    └──────────────── remaining hits 0 ───────────────┘
//! ```
//!
//! While absent in WORK the countdown holds; 180 consecutive absent ticks
//! reset it to the full work duration.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = TimerState::new(work, brk);
//! let mut presence = PresenceTracker::new();
//! // Every second:
//! for effect in timer.on_tick(&mut presence) { /* ... */ }
//! ```

use serde::{Deserialize, Serialize};

use super::mode::{DurationMinutes, Mode};
use super::remaining::Remaining;
use crate::presence::PresenceTracker;

/// Side effect requested by a transition, in the order it must be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Entered ALARM: start the looping alarm sound.
    StartAlarmLoop,
    /// Leaving ALARM: silence the loop before the break countdown runs.
    StopAlarmLoop,
    /// Entered BREAK: pick and show a break task.
    BreakStarted,
    /// BREAK finished: play the two-beep chime.
    PlayEndChime,
    /// Back in WORK with a full countdown.
    WorkResumed,
    /// Away threshold reached: work countdown restarted from full.
    AwayReset,
    /// A duration change was applied to the running countdown.
    CountdownReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerState {
    mode: Mode,
    remaining: Remaining,
    work_duration: DurationMinutes,
    break_duration: DurationMinutes,
}

impl TimerState {
    /// Start in WORK with a full work countdown.
    pub fn new(work_duration: DurationMinutes, break_duration: DurationMinutes) -> Self {
        Self {
            mode: Mode::Work,
            remaining: Remaining::full(work_duration),
            work_duration,
            break_duration,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining(&self) -> Remaining {
        self.remaining
    }

    pub fn work_duration(&self) -> DurationMinutes {
        self.work_duration
    }

    pub fn break_duration(&self) -> DurationMinutes {
        self.break_duration
    }

    /// Configured length of the current mode. ALARM counts as the end of
    /// the work session.
    pub fn current_duration(&self) -> DurationMinutes {
        match self.mode {
            Mode::Work | Mode::Alarm => self.work_duration,
            Mode::Break => self.break_duration,
        }
    }

    /// Whether the countdown would move on the next tick.
    pub fn is_counting(&self, present: bool) -> bool {
        match self.mode {
            Mode::Work => present,
            Mode::Alarm => false,
            Mode::Break => true,
        }
    }

    // ── Ports ────────────────────────────────────────────────────────

    /// One-second driver. Reads presence and, in WORK, updates its away
    /// counter.
    pub fn on_tick(&mut self, presence: &mut PresenceTracker) -> Vec<Effect> {
        match self.mode {
            Mode::Work if presence.present() => {
                self.remaining.decrement();
                if self.remaining.is_zero() {
                    self.mode = Mode::Alarm;
                    return vec![Effect::StartAlarmLoop];
                }
                Vec::new()
            }
            Mode::Work => {
                if presence.record_away_second() {
                    self.remaining = Remaining::full(self.work_duration);
                    return vec![Effect::AwayReset];
                }
                Vec::new()
            }
            // Absorbing until acknowledged.
            Mode::Alarm => Vec::new(),
            Mode::Break => {
                self.remaining.decrement();
                if self.remaining.is_zero() {
                    self.mode = Mode::Work;
                    self.remaining = Remaining::full(self.work_duration);
                    return vec![Effect::PlayEndChime, Effect::WorkResumed];
                }
                Vec::new()
            }
        }
    }

    /// Acknowledge the alarm and start the break. No-op outside ALARM.
    pub fn acknowledge(&mut self) -> Vec<Effect> {
        if self.mode != Mode::Alarm {
            return Vec::new();
        }
        self.mode = Mode::Break;
        self.remaining = Remaining::full(self.break_duration);
        vec![Effect::StopAlarmLoop, Effect::BreakStarted]
    }

    /// Store a new work duration, clamped to [1, 120]. Restarts the countdown
    /// only while in WORK; otherwise it applies on the next WORK entry.
    pub fn set_work_duration(&mut self, minutes: i64) -> Vec<Effect> {
        self.work_duration = DurationMinutes::clamped(minutes);
        if self.mode == Mode::Work {
            self.remaining = Remaining::full(self.work_duration);
            return vec![Effect::CountdownReset];
        }
        Vec::new()
    }

    /// Store a new break duration, clamped to [1, 120]. Restarts the
    /// countdown only while in BREAK.
    pub fn set_break_duration(&mut self, minutes: i64) -> Vec<Effect> {
        self.break_duration = DurationMinutes::clamped(minutes);
        if self.mode == Mode::Break {
            self.remaining = Remaining::full(self.break_duration);
            return vec![Effect::CountdownReset];
        }
        Vec::new()
    }
}
