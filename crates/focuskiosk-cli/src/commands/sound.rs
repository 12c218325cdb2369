//! `focuskiosk sound`: hear (or inspect) the scheduled sounds.

use clap::{Args, ValueEnum};
use focuskiosk_core::audio::EnvelopePoint;
use focuskiosk_core::{
    AudioBackend, AudioRequest, AudioScheduler, RecordingBackend, SettingsStore, ToneShape,
    TomlSettingsStore,
};
use serde::Serialize;

/// Envelope points shown in a dry run.
const PREVIEW_POINTS: usize = 6;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sound {
    /// The looping end-of-work alarm
    Alarm,
    /// The two-beep end-of-break chime
    Chime,
    /// The single settings preview beep
    Preview,
}

#[derive(Args, Debug)]
pub struct SoundArgs {
    #[arg(value_enum)]
    pub sound: Sound,
    /// Waveform; defaults to the stored setting
    #[arg(long)]
    pub tone: Option<ToneShape>,
    /// Volume 0-1; defaults to the stored setting
    #[arg(long)]
    pub volume: Option<f32>,
    /// How long to let the alarm loop before stopping it
    #[arg(long, default_value = "3")]
    pub seconds: f64,
    /// Print the scheduled envelope as JSON instead of playing it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct Schedule<'a> {
    sound: &'static str,
    tone: ToneShape,
    frequency_hz: f32,
    volume: f32,
    playback: focuskiosk_core::audio::Playback,
    points: usize,
    span_secs: f64,
    pattern: &'a [EnvelopePoint],
}

impl<'a> Schedule<'a> {
    fn of(sound: Sound, request: &'a AudioRequest) -> Self {
        let shown = request.pattern.len().min(PREVIEW_POINTS);
        Self {
            sound: match sound {
                Sound::Alarm => "alarm",
                Sound::Chime => "chime",
                Sound::Preview => "preview",
            },
            tone: request.tone,
            frequency_hz: request.frequency_hz,
            volume: request.volume,
            playback: request.playback,
            points: request.pattern.len(),
            span_secs: request.pattern_span_secs(),
            pattern: &request.pattern[..shown],
        }
    }
}

pub fn run(args: SoundArgs) -> Result<(), Box<dyn std::error::Error>> {
    let record = TomlSettingsStore::open_default()?.load()?;
    let tone = args.tone.unwrap_or(record.tone);
    let volume = args.volume.unwrap_or(record.volume);

    if args.dry_run {
        let mut audio = AudioScheduler::new(RecordingBackend::new());
        schedule(&mut audio, args.sound, tone, volume);
        let request = audio
            .backend()
            .started_requests()
            .first()
            .map(|r| (*r).clone())
            .ok_or("nothing was scheduled")?;
        println!("{}", serde_json::to_string_pretty(&Schedule::of(args.sound, &request))?);
        return Ok(());
    }

    play(args.sound, tone, volume, args.seconds)
}

fn schedule<B: AudioBackend>(
    audio: &mut AudioScheduler<B>,
    sound: Sound,
    tone: ToneShape,
    volume: f32,
) {
    match sound {
        Sound::Alarm => audio.start_alarm_loop(tone, volume),
        Sound::Chime => audio.play_end_of_break_chime(tone, volume),
        Sound::Preview => audio.play_preview_tone(tone, volume),
    }
}

#[cfg(feature = "playback")]
fn play(
    sound: Sound,
    tone: ToneShape,
    volume: f32,
    seconds: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    use std::time::Duration;

    let mut audio = AudioScheduler::new(focuskiosk_core::audio::SynthBackend::open()?);
    schedule(&mut audio, sound, tone, volume);
    let hold = match sound {
        Sound::Alarm => seconds.max(0.0),
        Sound::Chime => 1.1,
        Sound::Preview => 0.7,
    };
    std::thread::sleep(Duration::from_secs_f64(hold));
    audio.stop_alarm_loop();
    Ok(())
}

#[cfg(not(feature = "playback"))]
fn play(
    _sound: Sound,
    _tone: ToneShape,
    _volume: f32,
    _seconds: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    Err(focuskiosk_core::AudioError::DeviceUnavailable(
        "built without the `playback` feature; use --dry-run".into(),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alarm_schedule_summary_is_truncated() {
        let mut audio = AudioScheduler::new(RecordingBackend::new());
        schedule(&mut audio, Sound::Alarm, ToneShape::Square, 0.5);
        let requests = audio.backend().started_requests();
        let summary = Schedule::of(Sound::Alarm, requests[0]);
        assert_eq!(summary.points, 6000);
        assert_eq!(summary.pattern.len(), PREVIEW_POINTS);
        assert!((summary.span_secs - 599.9).abs() < 1e-6);
        assert!(audio.is_alarm_active());
    }

    #[test]
    fn preview_does_not_touch_alarm() {
        let mut audio = AudioScheduler::new(RecordingBackend::new());
        schedule(&mut audio, Sound::Preview, ToneShape::Sine, 0.3);
        assert!(!audio.is_alarm_active());
        assert_eq!(audio.backend().started_requests().len(), 1);
    }
}
