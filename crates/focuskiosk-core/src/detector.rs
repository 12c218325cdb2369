//! Control side of the external face detector.
//!
//! The detector itself is a black box that produces face counts; the kiosk
//! only tells it which minimum confidence to use, at startup and whenever
//! the sensitivity setting changes.

use crate::error::DetectorError;

pub trait DetectorControl {
    /// Start, or restart, the detector with the given minimum confidence.
    fn initialize(&mut self, min_confidence: f32) -> Result<(), DetectorError>;
}

/// No detector to manage: face counts are fed in by hand.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualFeed;

impl DetectorControl for ManualFeed {
    fn initialize(&mut self, _min_confidence: f32) -> Result<(), DetectorError> {
        Ok(())
    }
}

/// Test double that remembers every initialization.
#[derive(Debug, Default, Clone)]
pub struct RecordingDetector {
    pub initializations: Vec<f32>,
    pub fail_with: Option<String>,
}

impl RecordingDetector {
    pub fn failing(reason: &str) -> Self {
        Self {
            initializations: Vec::new(),
            fail_with: Some(reason.to_string()),
        }
    }
}

impl DetectorControl for RecordingDetector {
    fn initialize(&mut self, min_confidence: f32) -> Result<(), DetectorError> {
        self.initializations.push(min_confidence);
        match &self.fail_with {
            Some(reason) => Err(DetectorError::InitFailed(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Shared handle so tests can inspect a detector after handing it to the
/// kiosk.
impl<T: DetectorControl> DetectorControl for std::rc::Rc<std::cell::RefCell<T>> {
    fn initialize(&mut self, min_confidence: f32) -> Result<(), DetectorError> {
        self.borrow_mut().initialize(min_confidence)
    }
}
