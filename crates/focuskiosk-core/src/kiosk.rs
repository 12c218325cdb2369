//! Kiosk coordinator.
//!
//! Owns the timer, the presence tracker, the audio scheduler and the
//! settings snapshot, and exposes one port per input: detection results,
//! the one-second tick, and user commands. Every port returns the events it
//! produced. Nothing here blocks and nothing here fails the caller except
//! an out-of-range task index; degraded audio or detection is logged and
//! reported as events.

use chrono::Utc;
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use tracing::{info, warn};

use crate::audio::{AudioBackend, AudioScheduler, ToneShape};
use crate::detector::DetectorControl;
use crate::error::SettingsError;
use crate::events::Event;
use crate::presence::PresenceTracker;
use crate::storage::{SettingsRecord, SettingsStore};
use crate::timer::{Effect, Mode, Remaining, TimerState};

const CAMERA_NOTICE: &str = "Camera access denied or not found. Please allow camera access.";

pub struct Kiosk<B: AudioBackend> {
    timer: TimerState,
    presence: PresenceTracker,
    audio: AudioScheduler<B>,
    settings: SettingsRecord,
    store: Box<dyn SettingsStore>,
    /// False while the stored file could not be read, so it is never
    /// replaced with defaults.
    store_writable: bool,
    detector: Box<dyn DetectorControl>,
    rng: Mcg128Xsl64,
    break_task: Option<String>,
    camera_notice_shown: bool,
}

impl<B: AudioBackend> Kiosk<B> {
    /// Load settings and build the initial WORK state. A store that cannot
    /// be read yields defaults and is left untouched until a reset. Call [`Kiosk::start`] next to bring up the
    /// detector.
    pub fn new(
        backend: B,
        mut store: Box<dyn SettingsStore>,
        detector: Box<dyn DetectorControl>,
        seed: Option<u64>,
    ) -> Self {
        let (settings, store_writable) = match store.load() {
            Ok(settings) => (settings, true),
            Err(e) => {
                warn!(error = %e, "settings unreadable, using defaults");
                (SettingsRecord::default(), false)
            }
        };
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            timer: TimerState::new(settings.work_duration, settings.break_duration),
            presence: PresenceTracker::new(),
            audio: AudioScheduler::new(backend),
            settings,
            store,
            store_writable,
            detector,
            rng,
            break_task: None,
            camera_notice_shown: false,
        }
    }

    /// Initialize the detector with the stored sensitivity.
    pub fn start(&mut self) -> Vec<Event> {
        self.init_detector()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.timer.mode()
    }

    pub fn remaining(&self) -> Remaining {
        self.timer.remaining()
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    pub fn audio(&self) -> &AudioScheduler<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioScheduler<B> {
        &mut self.audio
    }

    /// Task shown for the current break, if in BREAK.
    pub fn break_task(&self) -> Option<&str> {
        self.break_task.as_deref()
    }

    pub fn snapshot(&self) -> Event {
        let remaining = self.timer.remaining();
        Event::StateSnapshot {
            mode: self.timer.mode(),
            remaining: remaining.to_string(),
            remaining_secs: remaining.total_secs(),
            present: self.presence.present(),
            away_seconds: self.presence.away_seconds(),
            break_task: self.break_task.clone(),
            work_duration_min: self.timer.work_duration().get(),
            break_duration_min: self.timer.break_duration().get(),
            at: Utc::now(),
        }
    }

    // ── Ports ────────────────────────────────────────────────────────

    pub fn on_detection_result(&mut self, face_count: u32) -> Vec<Event> {
        self.presence
            .on_detection_result(face_count)
            .map(presence_changed)
            .into_iter()
            .collect()
    }

    pub fn on_tick(&mut self) -> Vec<Event> {
        let effects = self.timer.on_tick(&mut self.presence);
        self.apply(effects)
    }

    /// Only acts in ALARM.
    pub fn acknowledge_alarm(&mut self) -> Vec<Event> {
        let effects = self.timer.acknowledge();
        self.apply(effects)
    }

    pub fn set_work_duration(&mut self, minutes: i64) -> Vec<Event> {
        let effects = self.timer.set_work_duration(minutes);
        self.settings.work_duration = self.timer.work_duration();
        let mut events = self.persist("work_duration", self.settings.work_duration.to_string());
        events.extend(self.apply(effects));
        events
    }

    pub fn set_break_duration(&mut self, minutes: i64) -> Vec<Event> {
        let effects = self.timer.set_break_duration(minutes);
        self.settings.break_duration = self.timer.break_duration();
        let mut events = self.persist("break_duration", self.settings.break_duration.to_string());
        events.extend(self.apply(effects));
        events
    }

    /// Store the new confidence threshold and restart the detector with it.
    pub fn update_detector_sensitivity(&mut self, sensitivity: f32) -> Vec<Event> {
        self.settings.sensitivity = sensitivity;
        self.settings = std::mem::take(&mut self.settings).normalized();
        let mut events = self.persist("sensitivity", self.settings.sensitivity.to_string());
        events.extend(self.init_detector());
        events
    }

    /// Store the tone and let the user hear it.
    pub fn set_tone(&mut self, tone: ToneShape) -> Vec<Event> {
        self.settings.tone = tone;
        let events = self.persist("tone", tone.to_string());
        self.preview();
        events
    }

    /// Store the volume (clamped to 0..=1) and let the user hear it.
    pub fn set_volume(&mut self, volume: f32) -> Vec<Event> {
        self.settings.volume = volume;
        self.settings = std::mem::take(&mut self.settings).normalized();
        let events = self.persist("volume", self.settings.volume.to_string());
        self.preview();
        events
    }

    pub fn preview(&mut self) {
        self.audio
            .play_preview_tone(self.settings.tone, self.settings.volume);
    }

    pub fn add_break_task(&mut self, task: &str) -> Vec<Event> {
        if !self.settings.add_break_task(task) {
            return Vec::new();
        }
        self.persist("break_tasks", self.settings.break_tasks.len().to_string())
    }

    pub fn remove_break_task(&mut self, index: usize) -> Result<Vec<Event>, SettingsError> {
        self.settings.remove_break_task(index)?;
        Ok(self.persist("break_tasks", self.settings.break_tasks.len().to_string()))
    }

    /// Forget all settings and start over in WORK with defaults.
    pub fn reset_settings(&mut self) -> Vec<Event> {
        if let Err(e) = self.store.reset() {
            warn!(error = %e, "could not clear settings store");
        }
        self.settings = match self.store.load() {
            Ok(settings) => {
                self.store_writable = true;
                settings
            }
            Err(e) => {
                warn!(error = %e, "settings unreadable after reset, using defaults");
                SettingsRecord::default()
            }
        };
        self.audio.stop_alarm_loop();
        self.timer = TimerState::new(self.settings.work_duration, self.settings.break_duration);
        self.break_task = None;
        info!("settings reset to defaults");

        let mut events = vec![Event::SettingsReset { at: Utc::now() }];
        events.extend(self.init_detector());
        events
    }

    /// The camera could not be acquired. The timer keeps running with
    /// presence treated as absent; the user is told once.
    pub fn on_camera_failure(&mut self, reason: &str) -> Vec<Event> {
        warn!(reason, "camera unavailable");
        let mut events: Vec<Event> = self
            .presence
            .mark_unavailable(false)
            .map(presence_changed)
            .into_iter()
            .collect();
        if !self.camera_notice_shown {
            self.camera_notice_shown = true;
            events.push(Event::Notice {
                message: CAMERA_NOTICE.to_string(),
                at: Utc::now(),
            });
        }
        events
    }

    /// The detector stopped producing results.
    pub fn on_detector_lost(&mut self, reason: &str) -> Vec<Event> {
        warn!(reason, "detector lost");
        let mut events: Vec<Event> = self
            .presence
            .mark_unavailable(false)
            .map(presence_changed)
            .into_iter()
            .collect();
        events.push(Event::DetectorUnavailable {
            reason: reason.to_string(),
            at: Utc::now(),
        });
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn init_detector(&mut self) -> Vec<Event> {
        let sensitivity = self.settings.sensitivity;
        match self.detector.initialize(sensitivity) {
            Ok(()) => {
                self.presence.mark_live();
                info!(sensitivity, "detector ready");
                vec![Event::DetectorReady {
                    sensitivity,
                    at: Utc::now(),
                }]
            }
            Err(e) => {
                warn!(error = %e, "detector unavailable, treating user as absent");
                let mut events: Vec<Event> = self
                    .presence
                    .mark_unavailable(false)
                    .map(presence_changed)
                    .into_iter()
                    .collect();
                events.push(Event::DetectorUnavailable {
                    reason: e.to_string(),
                    at: Utc::now(),
                });
                events
            }
        }
    }

    fn persist(&mut self, key: &str, value: String) -> Vec<Event> {
        if !self.store_writable {
            warn!(key, "not overwriting unreadable settings file; change kept for this session");
        } else if let Err(e) = self.store.save(&self.settings) {
            warn!(error = %e, key, "could not save settings");
        }
        vec![Event::SettingsChanged {
            key: key.to_string(),
            value,
            at: Utc::now(),
        }]
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Vec<Event> {
        let mut events = Vec::new();
        for effect in effects {
            match effect {
                Effect::StartAlarmLoop => {
                    info!("work session complete, alarm on");
                    self.audio
                        .start_alarm_loop(self.settings.tone, self.settings.volume);
                    events.push(Event::AlarmRaised { at: Utc::now() });
                }
                Effect::StopAlarmLoop => self.audio.stop_alarm_loop(),
                Effect::BreakStarted => {
                    let task = self.settings.pick_break_task(&mut self.rng);
                    info!(task = %task, "break started");
                    self.break_task = Some(task.clone());
                    events.push(Event::BreakStarted {
                        task,
                        duration_min: self.timer.break_duration().get(),
                        at: Utc::now(),
                    });
                }
                Effect::PlayEndChime => self
                    .audio
                    .play_end_of_break_chime(self.settings.tone, self.settings.volume),
                Effect::WorkResumed => {
                    info!("break over, back to work");
                    self.break_task = None;
                    events.push(Event::WorkResumed {
                        duration_min: self.timer.work_duration().get(),
                        at: Utc::now(),
                    });
                }
                Effect::AwayReset => {
                    info!("away threshold reached, work countdown restarted");
                    events.push(Event::AwayReset {
                        duration_min: self.timer.work_duration().get(),
                        at: Utc::now(),
                    });
                }
                Effect::CountdownReset => events.push(Event::CountdownReset {
                    mode: self.timer.mode(),
                    remaining: self.timer.remaining().to_string(),
                    at: Utc::now(),
                }),
            }
        }
        events
    }
}

fn presence_changed(present: bool) -> Event {
    Event::PresenceChanged {
        present,
        at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingBackend;
    use crate::detector::{ManualFeed, RecordingDetector};
    use crate::storage::MemorySettingsStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn kiosk_with(record: SettingsRecord) -> Kiosk<RecordingBackend> {
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(MemorySettingsStore::with_record(record)),
            Box::new(ManualFeed),
            Some(11),
        );
        kiosk.start();
        kiosk
    }

    fn short_session() -> SettingsRecord {
        SettingsRecord {
            work_duration: crate::timer::DurationMinutes::clamped(1),
            break_duration: crate::timer::DurationMinutes::clamped(1),
            ..SettingsRecord::default()
        }
    }

    fn reach_alarm(kiosk: &mut Kiosk<RecordingBackend>) {
        kiosk.on_detection_result(1);
        for _ in 0..60 {
            kiosk.on_tick();
        }
        assert_eq!(kiosk.mode(), Mode::Alarm);
    }

    #[test]
    fn alarm_starts_exactly_one_loop() {
        let mut kiosk = kiosk_with(short_session());
        reach_alarm(&mut kiosk);
        assert!(kiosk.audio().is_alarm_active());
        assert_eq!(kiosk.audio().backend().active_voices(), 1);

        for _ in 0..10 {
            assert!(kiosk.on_tick().is_empty());
        }
        assert_eq!(kiosk.audio().backend().started_requests().len(), 1);
    }

    #[test]
    fn acknowledge_silences_and_picks_task() {
        let mut kiosk = kiosk_with(short_session());
        reach_alarm(&mut kiosk);
        let events = kiosk.acknowledge_alarm();
        assert!(!kiosk.audio().is_alarm_active());
        assert_eq!(kiosk.audio().backend().active_voices(), 0);
        match &events[..] {
            [Event::BreakStarted { task, duration_min, .. }] => {
                assert!(kiosk.settings().break_tasks.contains(task));
                assert_eq!(*duration_min, 1);
                assert_eq!(kiosk.break_task(), Some(task.as_str()));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn break_end_plays_chime_and_resumes_work() {
        let mut kiosk = kiosk_with(short_session());
        reach_alarm(&mut kiosk);
        kiosk.acknowledge_alarm();
        let mut last = Vec::new();
        for _ in 0..60 {
            last = kiosk.on_tick();
        }
        assert!(matches!(last.as_slice(), [Event::WorkResumed { duration_min: 1, .. }]));
        assert_eq!(kiosk.mode(), Mode::Work);
        assert!(kiosk.break_task().is_none());

        let requests = kiosk.audio().backend().started_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].pattern.len(), 5);
    }

    #[test]
    fn duration_changes_are_saved() {
        let store = MemorySettingsStore::new();
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(store),
            Box::new(ManualFeed),
            Some(1),
        );
        let events = kiosk.set_work_duration(300);
        assert_eq!(kiosk.remaining().to_string(), "120:00");
        assert_eq!(kiosk.settings().work_duration.get(), 120);
        assert!(matches!(events[0], Event::SettingsChanged { .. }));
        assert!(matches!(events[1], Event::CountdownReset { mode: Mode::Work, .. }));

        let events = kiosk.set_break_duration(10);
        assert_eq!(events.len(), 1);
        assert_eq!(kiosk.remaining().to_string(), "120:00");
    }

    #[test]
    fn sensitivity_change_reinitializes_detector() {
        let detector = Rc::new(RefCell::new(RecordingDetector::default()));
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(MemorySettingsStore::new()),
            Box::new(detector.clone()),
            Some(1),
        );
        kiosk.start();
        kiosk.update_detector_sensitivity(0.8);
        kiosk.update_detector_sensitivity(7.0);
        assert_eq!(detector.borrow().initializations, vec![0.5, 0.8, 1.0]);
    }

    #[test]
    fn failed_detector_degrades_to_absent() {
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(MemorySettingsStore::new()),
            Box::new(RecordingDetector::failing("no gpu")),
            Some(1),
        );
        let events = kiosk.start();
        assert!(matches!(events.last(), Some(Event::DetectorUnavailable { .. })));
        assert!(kiosk.on_detection_result(1).is_empty());
        assert!(!kiosk.presence().present());

        kiosk.on_tick();
        assert_eq!(kiosk.remaining().to_string(), "25:00");
        assert_eq!(kiosk.presence().away_seconds(), 1);
    }

    #[test]
    fn camera_notice_is_shown_once() {
        let mut kiosk = kiosk_with(SettingsRecord::default());
        kiosk.on_detection_result(1);
        let first = kiosk.on_camera_failure("denied");
        assert_eq!(first.len(), 2);
        let second = kiosk.on_camera_failure("denied");
        assert!(second.is_empty());
    }

    #[test]
    fn tone_change_previews_and_cancels_alarm() {
        let mut kiosk = kiosk_with(short_session());
        reach_alarm(&mut kiosk);
        kiosk.set_tone(ToneShape::Square);
        assert!(!kiosk.audio().is_alarm_active());
        let requests = kiosk.audio().backend().started_requests();
        assert_eq!(requests.last().unwrap().tone, ToneShape::Square);
        assert_eq!(kiosk.settings().tone, ToneShape::Square);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut kiosk = kiosk_with(short_session());
        reach_alarm(&mut kiosk);
        let events = kiosk.reset_settings();
        assert!(matches!(events[0], Event::SettingsReset { .. }));
        assert_eq!(kiosk.mode(), Mode::Work);
        assert_eq!(kiosk.remaining().to_string(), "25:00");
        assert!(!kiosk.audio().is_alarm_active());
    }

    #[test]
    fn removing_missing_task_is_an_error() {
        let mut kiosk = kiosk_with(SettingsRecord::default());
        assert!(kiosk.remove_break_task(9).is_err());
        assert!(kiosk.remove_break_task(0).is_ok());
        assert_eq!(kiosk.settings().break_tasks.len(), 2);
    }

    /// Store whose file exists but cannot be read.
    struct UnreadableStore {
        saves: Rc<RefCell<usize>>,
        readable_after_reset: bool,
    }

    impl SettingsStore for UnreadableStore {
        fn load(&mut self) -> Result<SettingsRecord, SettingsError> {
            if self.readable_after_reset {
                return Ok(SettingsRecord::default());
            }
            Err(SettingsError::LoadFailed {
                path: "settings.toml".into(),
                message: "expected a value".into(),
            })
        }

        fn save(&mut self, _: &SettingsRecord) -> Result<(), SettingsError> {
            *self.saves.borrow_mut() += 1;
            Ok(())
        }

        fn reset(&mut self) -> Result<(), SettingsError> {
            self.readable_after_reset = true;
            Ok(())
        }
    }

    #[test]
    fn unreadable_settings_are_not_overwritten() {
        let saves = Rc::new(RefCell::new(0));
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(UnreadableStore {
                saves: saves.clone(),
                readable_after_reset: false,
            }),
            Box::new(ManualFeed),
            Some(5),
        );
        kiosk.set_tone(ToneShape::Square);
        kiosk.set_work_duration(40);
        assert_eq!(kiosk.settings().tone, ToneShape::Square);
        assert_eq!(*saves.borrow(), 0);

        kiosk.reset_settings();
        kiosk.set_volume(0.5);
        assert_eq!(*saves.borrow(), 1);
    }

    #[test]
    fn one_bad_setting_does_not_clobber_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "work_duration = 50\nbreak_duration = 15\nvolume = \"loud\"\nbreak_tasks = [\"Walk\"]\n",
        )
        .unwrap();
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(crate::storage::TomlSettingsStore::new(&path)),
            Box::new(ManualFeed),
            Some(5),
        );
        assert_eq!(kiosk.remaining().to_string(), "50:00");
        kiosk.set_tone(ToneShape::Square);

        let saved: SettingsRecord =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.work_duration.get(), 50);
        assert_eq!(saved.break_duration.get(), 15);
        assert_eq!(saved.break_tasks, vec!["Walk".to_string()]);
        assert_eq!(saved.tone, ToneShape::Square);
        assert_eq!(saved.volume, 0.3);
    }
}
