//! External face detector process.
//!
//! The detector is any program that prints one face count per line on
//! stdout. `{sensitivity}` in the command line is replaced by the minimum
//! confidence. A line starting with `camera-error` reports that the camera
//! could not be opened.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use focuskiosk_core::{DetectorControl, DetectorError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    Faces(u32),
    CameraError(String),
    Exited(String),
}

/// Messages are tagged with the detector generation that produced them so
/// output from a replaced process can be dropped.
pub type Tagged = (u64, FeedMessage);

pub struct ProcessDetector {
    template: String,
    child: Option<Child>,
    generation: Arc<AtomicU64>,
    tx: UnboundedSender<Tagged>,
}

impl ProcessDetector {
    pub fn new(template: String, tx: UnboundedSender<Tagged>) -> Self {
        Self {
            template,
            child: None,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    /// Current generation, shared with the feed consumer.
    pub fn generation(&self) -> Arc<AtomicU64> {
        self.generation.clone()
    }
}

impl DetectorControl for ProcessDetector {
    fn initialize(&mut self, min_confidence: f32) -> Result<(), DetectorError> {
        if let Some(mut old) = self.child.take() {
            if let Err(e) = old.start_kill() {
                debug!(error = %e, "previous detector already gone");
            }
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let command = self
            .template
            .replace("{sensitivity}", &format!("{min_confidence:.2}"));

        let mut child = shell(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DetectorError::InitFailed(format!("{command}: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DetectorError::InitFailed("detector stdout not captured".into()))?;

        info!(command = %command, generation, "detector started");
        tokio::spawn(forward_lines(stdout, generation, self.tx.clone()));
        self.child = Some(child);
        Ok(())
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

async fn forward_lines(stdout: ChildStdout, generation: u64, tx: UnboundedSender<Tagged>) {
    let mut lines = BufReader::new(stdout).lines();
    let reason = loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(msg) = parse_line(&line) {
                    if tx.send((generation, msg)).is_err() {
                        return;
                    }
                }
            }
            Ok(None) => break "detector exited".to_string(),
            Err(e) => break format!("detector output unreadable: {e}"),
        };
    };
    let _ = tx.send((generation, FeedMessage::Exited(reason)));
}

pub fn parse_line(line: &str) -> Option<FeedMessage> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("camera-error") {
        return Some(FeedMessage::CameraError(rest.trim().to_string()));
    }
    match line.parse::<u32>() {
        Ok(n) => Some(FeedMessage::Faces(n)),
        Err(_) => {
            debug!(line, "ignoring detector output");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counts_and_camera_errors() {
        assert_eq!(parse_line(" 2 "), Some(FeedMessage::Faces(2)));
        assert_eq!(parse_line("0"), Some(FeedMessage::Faces(0)));
        assert_eq!(
            parse_line("camera-error permission denied"),
            Some(FeedMessage::CameraError("permission denied".into()))
        );
        assert_eq!(parse_line("loading model..."), None);
        assert_eq!(parse_line("-1"), None);
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "current_thread")]
    async fn forwards_process_output_with_generation() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut detector = ProcessDetector::new("printf '1\\n0\\n'".into(), tx);
        detector.initialize(0.5).unwrap();

        assert_eq!(rx.recv().await, Some((1, FeedMessage::Faces(1))));
        assert_eq!(rx.recv().await, Some((1, FeedMessage::Faces(0))));
        assert!(matches!(rx.recv().await, Some((1, FeedMessage::Exited(_)))));
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "current_thread")]
    async fn substitutes_sensitivity() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut detector = ProcessDetector::new("echo camera-error {sensitivity}".into(), tx);
        detector.initialize(0.75).unwrap();
        assert_eq!(
            rx.recv().await,
            Some((1, FeedMessage::CameraError("0.75".into())))
        );
    }
}
