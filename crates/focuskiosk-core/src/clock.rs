//! Wall clock display, independent of the timer.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockFace {
    /// `HH:MM`
    pub time: String,
    /// `SS`
    pub seconds: String,
    /// `YYYY/MM/DD`
    pub date: String,
}

impl ClockFace {
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            time: format!("{:02}:{:02}", now.hour(), now.minute()),
            seconds: format!("{:02}", now.second()),
            date: format!("{}/{:02}/{:02}", now.year(), now.month(), now.day()),
        }
    }

    pub fn now() -> Self {
        Self::at(&Local::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn pads_every_field() {
        let t = Utc.with_ymd_and_hms(2026, 3, 7, 8, 5, 9).unwrap();
        let face = ClockFace::at(&t);
        assert_eq!(face.time, "08:05");
        assert_eq!(face.seconds, "09");
        assert_eq!(face.date, "2026/03/07");
    }
}
