//! Audio output chosen at startup.

use focuskiosk_core::audio::{AudioBackend, AudioRequest, SilentBackend, VoiceId};
use focuskiosk_core::AudioError;

pub enum Output {
    Silent(SilentBackend),
    #[cfg(feature = "playback")]
    Synth(focuskiosk_core::audio::SynthBackend),
}

impl Output {
    /// Real speakers when built with `playback` and not muted. Falls back to
    /// silence if no device opens; the timer runs either way.
    pub fn open(mute: bool) -> Self {
        if mute {
            return Output::Silent(SilentBackend::default());
        }
        Self::open_device()
    }

    #[cfg(feature = "playback")]
    fn open_device() -> Self {
        match focuskiosk_core::audio::SynthBackend::open() {
            Ok(synth) => Output::Synth(synth),
            Err(e) => {
                tracing::warn!(error = %e, "no audio output, running silent");
                Output::Silent(SilentBackend::default())
            }
        }
    }

    #[cfg(not(feature = "playback"))]
    fn open_device() -> Self {
        tracing::info!("built without audio playback, running silent");
        Output::Silent(SilentBackend::default())
    }
}

impl AudioBackend for Output {
    fn now(&self) -> f64 {
        match self {
            Output::Silent(b) => b.now(),
            #[cfg(feature = "playback")]
            Output::Synth(b) => b.now(),
        }
    }

    fn start_voice(&mut self, request: &AudioRequest, origin: f64) -> Result<VoiceId, AudioError> {
        match self {
            Output::Silent(b) => b.start_voice(request, origin),
            #[cfg(feature = "playback")]
            Output::Synth(b) => b.start_voice(request, origin),
        }
    }

    fn stop_voice(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        match self {
            Output::Silent(b) => b.stop_voice(voice),
            #[cfg(feature = "playback")]
            Output::Synth(b) => b.stop_voice(voice),
        }
    }

    fn disconnect_voice(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        match self {
            Output::Silent(b) => b.disconnect_voice(voice),
            #[cfg(feature = "playback")]
            Output::Synth(b) => b.disconnect_voice(voice),
        }
    }
}
