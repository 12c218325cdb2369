use tracing::{debug, warn};

use super::{AudioBackend, AudioRequest, EnvelopePoint, Playback, ToneShape, VoiceId};
use crate::storage::clamp_unit;

pub const ALARM_FREQUENCY_HZ: f32 = 1000.0;
/// A6, one octave above the A5 reference, so the preview is clearly higher
/// than the alarm.
pub const PREVIEW_FREQUENCY_HZ: f32 = 1760.0;

/// Beep/gap pairs scheduled per alarm loop (10 minutes of beeping).
pub const ALARM_REPETITIONS: usize = 3000;
const ALARM_BEEP_SECS: f64 = 0.1;
const ALARM_GAP_SECS: f64 = 0.1;

const CHIME_STOP_SECS: f64 = 1.0;
const PREVIEW_STOP_SECS: f64 = 0.6;

/// The looping alarm: beep 0.1s, silence 0.1s, repeated.
pub fn alarm_loop_request(tone: ToneShape, volume: f32) -> AudioRequest {
    let volume = clamp_unit(volume);
    let period = ALARM_BEEP_SECS + ALARM_GAP_SECS;
    let pattern = (0..ALARM_REPETITIONS)
        .flat_map(|i| {
            let start = i as f64 * period;
            [
                EnvelopePoint::new(start, volume),
                EnvelopePoint::new(start + ALARM_BEEP_SECS, 0.0),
            ]
        })
        .collect();
    AudioRequest {
        tone,
        volume,
        frequency_hz: ALARM_FREQUENCY_HZ,
        pattern,
        playback: Playback::Loop,
    }
}

/// Two 0.2s beeps at +0.1s and +0.4s.
pub fn end_chime_request(tone: ToneShape, volume: f32) -> AudioRequest {
    let volume = clamp_unit(volume);
    AudioRequest {
        tone,
        volume,
        frequency_hz: ALARM_FREQUENCY_HZ,
        pattern: vec![
            EnvelopePoint::new(0.0, 0.0),
            EnvelopePoint::new(0.1, volume),
            EnvelopePoint::new(0.3, 0.0),
            EnvelopePoint::new(0.4, volume),
            EnvelopePoint::new(0.6, 0.0),
        ],
        playback: Playback::StopAfter(CHIME_STOP_SECS),
    }
}

/// A single 0.5s beep for trying out tone and volume settings.
pub fn preview_request(tone: ToneShape, volume: f32) -> AudioRequest {
    let volume = clamp_unit(volume);
    AudioRequest {
        tone,
        volume,
        frequency_hz: PREVIEW_FREQUENCY_HZ,
        pattern: vec![
            EnvelopePoint::new(0.0, 0.0),
            EnvelopePoint::new(0.05, volume),
            EnvelopePoint::new(0.55, 0.0),
        ],
        playback: Playback::StopAfter(PREVIEW_STOP_SECS),
    }
}

/// Owns the single alarm voice. Every operation is best-effort: backend
/// failures are logged and dropped.
#[derive(Debug)]
pub struct AudioScheduler<B: AudioBackend> {
    backend: B,
    alarm: Option<VoiceId>,
}

impl<B: AudioBackend> AudioScheduler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            alarm: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn is_alarm_active(&self) -> bool {
        self.alarm.is_some()
    }

    /// Replace any running loop with a fresh one. The old voice is fully torn
    /// down before the new one is created.
    pub fn start_alarm_loop(&mut self, tone: ToneShape, volume: f32) {
        self.stop_alarm_loop();
        let request = alarm_loop_request(tone, volume);
        self.alarm = self.start(&request);
    }

    /// Tear down the alarm voice, if any.
    pub fn stop_alarm_loop(&mut self) {
        let Some(voice) = self.alarm.take() else {
            return;
        };
        if let Err(e) = self.backend.stop_voice(voice) {
            debug!(voice = voice.0, error = %e, "ignoring alarm stop failure");
        }
        if let Err(e) = self.backend.disconnect_voice(voice) {
            debug!(voice = voice.0, error = %e, "ignoring alarm disconnect failure");
        }
    }

    pub fn play_end_of_break_chime(&mut self, tone: ToneShape, volume: f32) {
        self.stop_alarm_loop();
        self.start(&end_chime_request(tone, volume));
    }

    pub fn play_preview_tone(&mut self, tone: ToneShape, volume: f32) {
        self.stop_alarm_loop();
        self.start(&preview_request(tone, volume));
    }

    fn start(&mut self, request: &AudioRequest) -> Option<VoiceId> {
        let origin = self.backend.now();
        match self.backend.start_voice(request, origin) {
            Ok(voice) => Some(voice),
            Err(e) => {
                warn!(error = %e, frequency_hz = request.frequency_hz, "could not start voice");
                None
            }
        }
    }
}
