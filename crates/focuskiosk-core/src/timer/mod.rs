mod engine;
mod mode;
mod remaining;

pub use engine::{Effect, TimerState};
pub use mode::{DurationMinutes, Mode, MAX_DURATION_MIN, MIN_DURATION_MIN};
pub use remaining::Remaining;
