//! Alarm and chime scheduling.
//!
//! Sounds are described up front as an [`AudioRequest`]: an oscillator shape
//! and pitch plus a list of gain steps relative to a schedule origin. The
//! [`AudioScheduler`] turns logical requests ("alarm", "end of break",
//! "preview") into requests against an [`AudioBackend`], which owns the
//! monotonic audio clock.

mod backend;
mod scheduler;
#[cfg(feature = "playback")]
mod synth;

pub use backend::{AudioBackend, AudioCall, RecordingBackend, SilentBackend, VoiceId};
pub use scheduler::{
    alarm_loop_request, end_chime_request, preview_request, AudioScheduler,
    ALARM_FREQUENCY_HZ, ALARM_REPETITIONS, PREVIEW_FREQUENCY_HZ,
};
#[cfg(feature = "playback")]
pub use synth::SynthBackend;

use serde::{Deserialize, Serialize};

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ToneShape {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl ToneShape {
    pub const ALL: [ToneShape; 4] = [
        ToneShape::Sine,
        ToneShape::Square,
        ToneShape::Triangle,
        ToneShape::Sawtooth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneShape::Sine => "sine",
            ToneShape::Square => "square",
            ToneShape::Triangle => "triangle",
            ToneShape::Sawtooth => "sawtooth",
        }
    }

    /// Amplitude in [-1, 1] at `phase` in [0, 1).
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            ToneShape::Sine => (phase * std::f32::consts::TAU).sin(),
            ToneShape::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            ToneShape::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
            ToneShape::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

impl std::fmt::Display for ToneShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for ToneShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToneShape::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tone '{s}' (expected sine, square, triangle or sawtooth)"))
    }
}

impl TryFrom<String> for ToneShape {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Gain step: from `offset_secs` after the origin the voice plays at `level`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    pub offset_secs: f64,
    pub level: f32,
}

impl EnvelopePoint {
    pub fn new(offset_secs: f64, level: f32) -> Self {
        Self { offset_secs, level }
    }
}

/// How long a voice lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playback {
    /// Runs until explicitly stopped.
    Loop,
    /// Stops itself this many seconds after the origin.
    StopAfter(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRequest {
    pub tone: ToneShape,
    pub volume: f32,
    pub frequency_hz: f32,
    /// Gain steps in ascending offset order. The voice is silent before the
    /// first one.
    pub pattern: Vec<EnvelopePoint>,
    pub playback: Playback,
}

impl AudioRequest {
    /// Seconds covered by the pattern.
    pub fn pattern_span_secs(&self) -> f64 {
        self.pattern.last().map(|p| p.offset_secs).unwrap_or(0.0)
    }

    /// Gain in effect `offset_secs` after the origin.
    pub fn level_at(&self, offset_secs: f64) -> f32 {
        self.pattern
            .iter()
            .take_while(|p| p.offset_secs <= offset_secs)
            .last()
            .map(|p| p.level)
            .unwrap_or(0.0)
    }
}
