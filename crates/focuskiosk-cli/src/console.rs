//! Terminal front end: stdin commands in, status line and events out.

use std::io::Write;
use std::str::FromStr;

use focuskiosk_core::{AudioBackend, ClockFace, Event, Kiosk, Mode, SettingsError, ToneShape};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ack,
    Faces(u32),
    Work(i64),
    Break(i64),
    Sensitivity(f32),
    Tone(ToneShape),
    Volume(f32),
    TaskAdd(String),
    TaskRemove(usize),
    Status,
    Reset,
    Quit,
}

pub const HELP: &str = "commands: ack | faces N | work MIN | break MIN | sensitivity 0-1 | \
tone sine|square|triangle|sawtooth | volume 0-1 | task add TEXT | task remove N | status | reset | quit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let number = |what: &str| format!("'{word}' expects {what}, got '{rest}'");

        match word.to_ascii_lowercase().as_str() {
            "ack" | "a" => Ok(Command::Ack),
            "faces" => rest.parse().map(Command::Faces).map_err(|_| number("a face count")),
            "work" => rest.parse().map(Command::Work).map_err(|_| number("minutes")),
            "break" => rest.parse().map(Command::Break).map_err(|_| number("minutes")),
            "sensitivity" => rest
                .parse()
                .map(Command::Sensitivity)
                .map_err(|_| number("a number between 0 and 1")),
            "tone" => rest.parse().map(Command::Tone),
            "volume" => rest
                .parse()
                .map(Command::Volume)
                .map_err(|_| number("a number between 0 and 1")),
            "task" => {
                let (sub, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                match sub {
                    "add" => Ok(Command::TaskAdd(arg.trim().to_string())),
                    "remove" | "rm" => arg
                        .trim()
                        .parse()
                        .map(Command::TaskRemove)
                        .map_err(|_| format!("'task remove' expects an index, got '{}'", arg.trim())),
                    _ => Err("expected 'task add TEXT' or 'task remove N'".to_string()),
                }
            }
            "status" | "s" => Ok(Command::Status),
            "reset" => Ok(Command::Reset),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "" => Err(HELP.to_string()),
            other => Err(format!("unknown command '{other}'. {HELP}")),
        }
    }
}

/// Apply one command. Returns `None` for `quit`.
pub fn dispatch<B: AudioBackend>(
    kiosk: &mut Kiosk<B>,
    command: Command,
) -> Option<Result<Vec<Event>, SettingsError>> {
    let events = match command {
        Command::Ack => kiosk.acknowledge_alarm(),
        Command::Faces(n) => kiosk.on_detection_result(n),
        Command::Work(n) => kiosk.set_work_duration(n),
        Command::Break(n) => kiosk.set_break_duration(n),
        Command::Sensitivity(x) => kiosk.update_detector_sensitivity(x),
        Command::Tone(t) => kiosk.set_tone(t),
        Command::Volume(v) => kiosk.set_volume(v),
        Command::TaskAdd(task) => kiosk.add_break_task(&task),
        Command::TaskRemove(index) => return Some(kiosk.remove_break_task(index)),
        Command::Status => vec![kiosk.snapshot()],
        Command::Reset => kiosk.reset_settings(),
        Command::Quit => return None,
    };
    Some(Ok(events))
}

pub struct Console {
    json: bool,
}

impl Console {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn emit(&self, events: &[Event]) {
        let mut out = std::io::stdout().lock();
        for event in events {
            debug!(event = event.name(), "emit");
            if self.json {
                if let Ok(line) = serde_json::to_string(event) {
                    let _ = writeln!(out, "{line}");
                }
            } else if let Some(text) = describe(event) {
                let _ = writeln!(out, "\r\x1b[2K{text}");
            }
        }
        let _ = out.flush();
    }

    /// Report a command that could not be applied. Goes to stderr so JSON
    /// output stays parseable.
    pub fn reject(&self, message: &str) {
        if self.json {
            eprintln!("{message}");
        } else {
            eprintln!("\r\x1b[2K{message}");
        }
    }

    /// Redraw the one-line status display. Nothing in JSON mode.
    pub fn status<B: AudioBackend>(&self, kiosk: &Kiosk<B>) {
        if self.json {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K{}", status_line(kiosk, &ClockFace::now()));
        let _ = out.flush();
    }
}

pub fn status_line<B: AudioBackend>(kiosk: &Kiosk<B>, clock: &ClockFace) -> String {
    let presence = if kiosk.presence().present() {
        "present".to_string()
    } else {
        format!("away {}s", kiosk.presence().away_seconds())
    };
    let mut line = format!(
        "{}:{}  {}  | {:<5} {} | {}",
        clock.time,
        clock.seconds,
        clock.date,
        kiosk.mode(),
        kiosk.remaining(),
        presence
    );
    match kiosk.mode() {
        Mode::Alarm => line.push_str(" | type 'ack' to start the break"),
        Mode::Break => {
            if let Some(task) = kiosk.break_task() {
                line.push_str(&format!(" | {task}"));
            }
        }
        Mode::Work => {}
    }
    line
}

fn describe(event: &Event) -> Option<String> {
    match event {
        Event::AlarmRaised { .. } => Some("Work session complete. Type 'ack' to take a break.".into()),
        Event::BreakStarted { task, duration_min, .. } => {
            Some(format!("Break for {duration_min} min: {task}"))
        }
        Event::WorkResumed { duration_min, .. } => {
            Some(format!("Break over. Next work session: {duration_min} min."))
        }
        Event::AwayReset { duration_min, .. } => {
            Some(format!("Away too long. Work timer reset to {duration_min} min."))
        }
        Event::CountdownReset { mode, remaining, .. } => Some(format!("{mode} timer set to {remaining}")),
        Event::SettingsChanged { key, value, .. } => Some(format!("{key} = {value}")),
        Event::SettingsReset { .. } => Some("Settings reset to defaults.".into()),
        Event::DetectorUnavailable { reason, .. } => {
            Some(format!("Face detection unavailable ({reason}); treating you as away."))
        }
        Event::Notice { message, .. } => Some(message.clone()),
        Event::StateSnapshot { .. } => serde_json::to_string_pretty(event).ok(),
        Event::PresenceChanged { .. } | Event::DetectorReady { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focuskiosk_core::{ManualFeed, MemorySettingsStore, RecordingBackend};

    #[test]
    fn parses_commands() {
        assert_eq!("ack".parse::<Command>(), Ok(Command::Ack));
        assert_eq!(" faces 2 ".parse::<Command>(), Ok(Command::Faces(2)));
        assert_eq!("work 30".parse::<Command>(), Ok(Command::Work(30)));
        assert_eq!("break -4".parse::<Command>(), Ok(Command::Break(-4)));
        assert_eq!("tone Square".parse::<Command>(), Ok(Command::Tone(ToneShape::Square)));
        assert_eq!(
            "task add Walk around the block".parse::<Command>(),
            Ok(Command::TaskAdd("Walk around the block".into()))
        );
        assert_eq!("task rm 1".parse::<Command>(), Ok(Command::TaskRemove(1)));
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!("faces many".parse::<Command>().is_err());
        assert!("tone noise".parse::<Command>().is_err());
        assert!("task".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[test]
    fn dispatch_drives_kiosk() {
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(MemorySettingsStore::new()),
            Box::new(ManualFeed),
            Some(3),
        );
        let events = dispatch(&mut kiosk, Command::Work(10)).unwrap().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(kiosk.remaining().to_string(), "10:00");
        assert!(dispatch(&mut kiosk, Command::TaskRemove(99)).unwrap().is_err());
        assert!(dispatch(&mut kiosk, Command::Quit).is_none());
    }

    #[test]
    fn status_line_shows_mode_and_presence() {
        let mut kiosk = Kiosk::new(
            RecordingBackend::new(),
            Box::new(MemorySettingsStore::new()),
            Box::new(ManualFeed),
            Some(3),
        );
        let clock = ClockFace {
            time: "09:30".into(),
            seconds: "05".into(),
            date: "2026/10/18".into(),
        };
        kiosk.on_tick();
        assert_eq!(
            status_line(&kiosk, &clock),
            "09:30:05  2026/10/18  | WORK  25:00 | away 1s"
        );
        kiosk.on_detection_result(1);
        assert!(status_line(&kiosk, &clock).ends_with("| present"));
    }
}
