//! `focuskiosk run`: the kiosk itself.
//!
//! One `select!` loop owns the [`Kiosk`] and multiplexes the one-second
//! tick, the detector feed, stdin commands and ctrl-c.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use focuskiosk_core::error::Result;
use focuskiosk_core::{
    AudioBackend, DetectorControl, Event, Kiosk, ManualFeed, MemorySettingsStore, SettingsStore,
    TomlSettingsStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::console::{self, Command, Console};
use crate::detector::{FeedMessage, ProcessDetector, Tagged};
use crate::output::Output;

const TICK: Duration = Duration::from_secs(1);

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Face detector command. Prints one face count per line; `{sensitivity}`
    /// is replaced by the minimum confidence. Without it, feed counts with
    /// the `faces N` command.
    #[arg(long)]
    pub detector: Option<String>,
    /// Print events as JSON lines instead of the status display
    #[arg(long)]
    pub json: bool,
    /// Never open an audio device
    #[arg(long)]
    pub mute: bool,
    /// Keep settings in memory; nothing is written to disk
    #[arg(long)]
    pub ephemeral: bool,
    /// Seed for break-task selection
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: RunArgs) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(args))
}

async fn drive(args: RunArgs) -> Result<()> {
    let store: Box<dyn SettingsStore> = if args.ephemeral {
        Box::new(MemorySettingsStore::new())
    } else {
        Box::new(TomlSettingsStore::open_default()?)
    };

    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel::<Tagged>();
    let mut generation: Option<Arc<AtomicU64>> = None;
    let detector: Box<dyn DetectorControl> = match args.detector {
        Some(template) => {
            let process = ProcessDetector::new(template, feed_tx);
            generation = Some(process.generation());
            Box::new(process)
        }
        None => {
            drop(feed_tx);
            Box::new(ManualFeed)
        }
    };

    let console = Console::new(args.json);
    let mut kiosk = Kiosk::new(Output::open(args.mute), store, detector, args.seed);
    console.emit(&kiosk.start());
    if !args.json {
        println!("{}", console::HELP);
    }
    info!(
        work_min = kiosk.timer().work_duration().get(),
        break_min = kiosk.timer().break_duration().get(),
        "kiosk running"
    );

    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut feed_open = generation.is_some();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    console.status(&kiosk);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                console.emit(&kiosk.on_tick());
                console.status(&kiosk);
            }
            message = feed_rx.recv(), if feed_open => match message {
                Some((tag, message)) => {
                    if generation.as_ref().is_some_and(|g| g.load(Ordering::SeqCst) != tag) {
                        debug!(tag, "dropping output from replaced detector");
                        continue;
                    }
                    console.emit(&feed(&mut kiosk, message));
                }
                None => feed_open = false,
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(command) => match console::dispatch(&mut kiosk, command) {
                            Some(Ok(events)) => console.emit(&events),
                            Some(Err(e)) => console.reject(&e.to_string()),
                            None => break,
                        },
                        Err(message) => console.reject(&message),
                    }
                    console.status(&kiosk);
                }
                Ok(None) => {
                    debug!("stdin closed, commands disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "stdin unreadable, commands disabled");
                    stdin_open = false;
                }
            },
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    kiosk.audio_mut().stop_alarm_loop();
    if !args.json {
        println!();
    }
    info!("kiosk stopped");
    Ok(())
}

fn feed<B: AudioBackend>(kiosk: &mut Kiosk<B>, message: FeedMessage) -> Vec<Event> {
    match message {
        FeedMessage::Faces(count) => kiosk.on_detection_result(count),
        FeedMessage::CameraError(reason) => kiosk.on_camera_failure(&reason),
        FeedMessage::Exited(reason) => kiosk.on_detector_lost(&reason),
    }
}
