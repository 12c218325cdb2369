//! Oscillator synthesis on the default cpal output device.
//!
//! The stream callback owns the sample clock. `now()` reads the number of
//! frames rendered so far, so envelopes scheduled against it land on exact
//! sample boundaries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info};

use super::{AudioBackend, AudioRequest, Playback, ToneShape, VoiceId};
use crate::error::AudioError;

struct Voice {
    id: VoiceId,
    tone: ToneShape,
    frequency_hz: f32,
    phase: f32,
    /// (absolute frame, level), ascending.
    steps: Vec<(u64, f32)>,
    cursor: usize,
    level: f32,
    stop_at: Option<u64>,
    stopped: bool,
}

impl Voice {
    fn render(&mut self, frame: u64, sample_rate: f32) -> f32 {
        while let Some(&(at, level)) = self.steps.get(self.cursor) {
            if at > frame {
                break;
            }
            self.level = level;
            self.cursor += 1;
        }
        let out = self.tone.sample(self.phase) * self.level;
        self.phase = (self.phase + self.frequency_hz / sample_rate).fract();
        out
    }

    fn finished(&self, frame: u64) -> bool {
        self.stop_at.is_some_and(|at| frame >= at)
    }
}

/// Voices live here from start until they are disconnected or run past
/// their stop frame. Nothing about a voice outlives its entry.
#[derive(Default)]
struct Mixer {
    voices: Vec<Voice>,
}

impl Mixer {
    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let v = self
            .voices
            .iter_mut()
            .find(|v| v.id == voice)
            .ok_or(AudioError::AlreadyDisconnected(voice.0))?;
        if v.stopped {
            return Err(AudioError::AlreadyStopped(voice.0));
        }
        // Silence immediately; the voice itself goes away on disconnect.
        v.stopped = true;
        v.steps.clear();
        v.level = 0.0;
        Ok(())
    }

    fn disconnect(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let before = self.voices.len();
        self.voices.retain(|v| v.id != voice);
        if self.voices.len() == before {
            return Err(AudioError::AlreadyDisconnected(voice.0));
        }
        Ok(())
    }
}

pub struct SynthBackend {
    _stream: cpal::Stream,
    sample_rate: u32,
    frames: Arc<AtomicU64>,
    mixer: Arc<Mutex<Mixer>>,
    next_id: u64,
}

impl std::fmt::Debug for SynthBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthBackend")
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frames.load(Ordering::Relaxed))
            .finish()
    }
}

impl SynthBackend {
    /// Open the default output device and start a silent stream.
    pub fn open() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no output device".into()))?;
        info!("Audio Output Device: {}", device.name().unwrap_or_default());

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        let sample_rate = config.sample_rate().0;
        let channels = usize::from(config.channels());

        let frames = Arc::new(AtomicU64::new(0));
        let mixer = Arc::new(Mutex::new(Mixer::default()));
        let err_fn = |err| error!("an error occurred on output stream: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let (frames, mixer) = (frames.clone(), mixer.clone());
                device.build_output_stream(
                    &config.into(),
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        write_frames(data, channels, sample_rate, &frames, &mixer, |s| s)
                    },
                    err_fn,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let (frames, mixer) = (frames.clone(), mixer.clone());
                device.build_output_stream(
                    &config.into(),
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        write_frames(data, channels, sample_rate, &frames, &mixer, |s| {
                            (s * f32::from(i16::MAX)) as i16
                        })
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(AudioError::DeviceUnavailable(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        }
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        info!("Audio Config Selected: Rate={}Hz, Channels={}", sample_rate, channels);

        Ok(Self {
            _stream: stream,
            sample_rate,
            frames,
            mixer,
            next_id: 0,
        })
    }

    fn to_frame(&self, secs: f64) -> u64 {
        (secs.max(0.0) * f64::from(self.sample_rate)).round() as u64
    }

    fn check_known(&self, voice: VoiceId) -> Result<(), AudioError> {
        if voice.0 == 0 || voice.0 > self.next_id {
            return Err(AudioError::UnknownVoice(voice.0));
        }
        Ok(())
    }

    fn with_mixer<R>(&self, f: impl FnOnce(&mut Mixer) -> R) -> R {
        let mut guard = match self.mixer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

fn write_frames<T: Copy>(
    data: &mut [T],
    channels: usize,
    sample_rate: u32,
    frames: &AtomicU64,
    mixer: &Mutex<Mixer>,
    convert: impl Fn(f32) -> T,
) {
    let Ok(mut mixer) = mixer.try_lock() else {
        // Scheduler holds the lock; emit silence rather than block the device.
        let silence = convert(0.0);
        data.iter_mut().for_each(|s| *s = silence);
        frames.fetch_add((data.len() / channels.max(1)) as u64, Ordering::Relaxed);
        return;
    };
    let rate = sample_rate as f32;
    let mut frame = frames.load(Ordering::Relaxed);
    for out in data.chunks_mut(channels.max(1)) {
        let mixed: f32 = mixer.voices.iter_mut().map(|v| v.render(frame, rate)).sum();
        let sample = convert(mixed.clamp(-1.0, 1.0));
        out.iter_mut().for_each(|s| *s = sample);
        frame += 1;
    }
    mixer.voices.retain(|v| !v.finished(frame));
    frames.store(frame, Ordering::Relaxed);
}

impl AudioBackend for SynthBackend {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Relaxed) as f64 / f64::from(self.sample_rate)
    }

    fn start_voice(&mut self, request: &AudioRequest, origin: f64) -> Result<VoiceId, AudioError> {
        self.next_id += 1;
        let id = VoiceId(self.next_id);
        let steps = request
            .pattern
            .iter()
            .map(|p| (self.to_frame(origin + p.offset_secs), p.level))
            .collect();
        let stop_at = match request.playback {
            Playback::Loop => None,
            Playback::StopAfter(secs) => Some(self.to_frame(origin + secs)),
        };
        let voice = Voice {
            id,
            tone: request.tone,
            frequency_hz: request.frequency_hz,
            phase: 0.0,
            steps,
            cursor: 0,
            level: 0.0,
            stop_at,
            stopped: false,
        };
        self.with_mixer(|m| m.voices.push(voice));
        Ok(id)
    }

    fn stop_voice(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        self.check_known(voice)?;
        self.with_mixer(|m| m.stop(voice))
    }

    fn disconnect_voice(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        self.check_known(voice)?;
        self.with_mixer(|m| m.disconnect(voice))
    }
}
