use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;

use super::{AudioRequest, Playback};
use crate::error::AudioError;

/// Handle to one oscillator + gain pair owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VoiceId(pub u64);

/// Platform audio output.
///
/// Every gain step of a request is scheduled when the voice starts; the
/// backend never calls back into the scheduler.
pub trait AudioBackend {
    /// Monotonic audio clock, in seconds.
    fn now(&self) -> f64;

    /// Create a voice, schedule `request.pattern` relative to `origin`, and
    /// start it.
    fn start_voice(&mut self, request: &AudioRequest, origin: f64) -> Result<VoiceId, AudioError>;

    /// Stop the oscillator. Fails if it was already stopped.
    fn stop_voice(&mut self, voice: VoiceId) -> Result<(), AudioError>;

    /// Release the oscillator and gain node. Fails if already released.
    fn disconnect_voice(&mut self, voice: VoiceId) -> Result<(), AudioError>;
}

/// Backend for headless runs: accepts everything, plays nothing.
#[derive(Debug)]
pub struct SilentBackend {
    epoch: Instant,
    next_id: u64,
}

impl Default for SilentBackend {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
            next_id: 0,
        }
    }
}

impl AudioBackend for SilentBackend {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start_voice(&mut self, _request: &AudioRequest, _origin: f64) -> Result<VoiceId, AudioError> {
        self.next_id += 1;
        Ok(VoiceId(self.next_id))
    }

    fn stop_voice(&mut self, _voice: VoiceId) -> Result<(), AudioError> {
        Ok(())
    }

    fn disconnect_voice(&mut self, _voice: VoiceId) -> Result<(), AudioError> {
        Ok(())
    }
}

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum AudioCall {
    Start {
        voice: VoiceId,
        origin: f64,
        request: AudioRequest,
    },
    Stop {
        voice: VoiceId,
    },
    Disconnect {
        voice: VoiceId,
    },
}

#[derive(Debug, Clone)]
struct RecordedVoice {
    origin: f64,
    playback: Playback,
    stopped: bool,
    disconnected: bool,
}

/// Test double with a manually advanced clock. Records every call and
/// tracks which voices are still producing sound.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    clock: f64,
    next_id: u64,
    calls: Vec<AudioCall>,
    voices: HashMap<VoiceId, RecordedVoice>,
    fail_starts: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `start_voice` always fails, as with no output device.
    pub fn failing() -> Self {
        Self {
            fail_starts: true,
            ..Self::default()
        }
    }

    pub fn advance(&mut self, secs: f64) {
        self.clock += secs;
    }

    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Requests started so far, in order.
    pub fn started_requests(&self) -> Vec<&AudioRequest> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                AudioCall::Start { request, .. } => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Voices that are neither released nor past their self-stop time.
    pub fn active_voices(&self) -> usize {
        self.voices
            .values()
            .filter(|v| !v.stopped && !v.disconnected)
            .filter(|v| match v.playback {
                Playback::Loop => true,
                Playback::StopAfter(secs) => self.clock < v.origin + secs,
            })
            .count()
    }
}

impl AudioBackend for RecordingBackend {
    fn now(&self) -> f64 {
        self.clock
    }

    fn start_voice(&mut self, request: &AudioRequest, origin: f64) -> Result<VoiceId, AudioError> {
        if self.fail_starts {
            return Err(AudioError::DeviceUnavailable("recording backend set to fail".into()));
        }
        self.next_id += 1;
        let voice = VoiceId(self.next_id);
        self.voices.insert(
            voice,
            RecordedVoice {
                origin,
                playback: request.playback,
                stopped: false,
                disconnected: false,
            },
        );
        self.calls.push(AudioCall::Start {
            voice,
            origin,
            request: request.clone(),
        });
        Ok(voice)
    }

    fn stop_voice(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let v = self
            .voices
            .get_mut(&voice)
            .ok_or(AudioError::UnknownVoice(voice.0))?;
        self.calls.push(AudioCall::Stop { voice });
        if v.stopped {
            return Err(AudioError::AlreadyStopped(voice.0));
        }
        v.stopped = true;
        Ok(())
    }

    fn disconnect_voice(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let v = self
            .voices
            .get_mut(&voice)
            .ok_or(AudioError::UnknownVoice(voice.0))?;
        self.calls.push(AudioCall::Disconnect { voice });
        if v.disconnected {
            return Err(AudioError::AlreadyDisconnected(voice.0));
        }
        v.disconnected = true;
        Ok(())
    }
}
