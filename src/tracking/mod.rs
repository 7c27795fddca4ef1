//! Hand tracking sessions
//!
//! A [`LandmarkSource`] is opened and read on a dedicated worker thread. The
//! worker runs the gesture tracker on every frame and publishes throttled
//! gesture states into a latest-value slot the render loop polls.

pub mod replay;
pub mod session;
pub mod throttle;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hand::LandmarkFrame;

pub use replay::ReplaySource;
pub use session::TrackingSession;
pub use throttle::EmissionThrottle;

/// Errors raised while acquiring or reading a landmark source
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("hand landmark model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("cannot read replay file {path}: {source}")]
    Replay {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid landmark frame on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("failed to spawn tracking thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("tracking thread exited before the source was opened")]
    WorkerExited,
}

/// Anything that yields landmark frames
///
/// `open` and every later call happen on the tracking worker thread.
pub trait LandmarkSource: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Acquire the underlying device or file
    fn open(&mut self) -> Result<(), TrackingError>;

    /// Next frame, blocking until one is available.
    ///
    /// `Ok(None)` ends the stream. An error affects only the current frame.
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, TrackingError>;

    /// Release the device. Must be safe to call after a failed `open`.
    fn close(&mut self);
}

/// Owns a source and closes it on every exit path
pub struct SourceGuard {
    source: Box<dyn LandmarkSource>,
}

impl SourceGuard {
    pub fn new(source: Box<dyn LandmarkSource>) -> Self {
        Self { source }
    }

    pub fn source_mut(&mut self) -> &mut dyn LandmarkSource {
        self.source.as_mut()
    }
}

impl Drop for SourceGuard {
    fn drop(&mut self) {
        tracing::debug!(source = self.source.name(), "Closing landmark source");
        self.source.close();
    }
}

/// User-facing tracking status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HandStatus {
    #[default]
    Disabled,
    Initializing,
    NoHands,
    OneHand,
    TwoHands,
    Failed(String),
}

impl HandStatus {
    pub fn from_hands_count(count: u8) -> Self {
        match count {
            0 => HandStatus::NoHands,
            1 => HandStatus::OneHand,
            _ => HandStatus::TwoHands,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HandStatus::Disabled => "Hands off",
            HandStatus::Initializing => "Initializing…",
            HandStatus::NoHands => "Show your hand",
            HandStatus::OneHand => "Hands: 1",
            HandStatus::TwoHands => "Hands: 2 (zoom)",
            HandStatus::Failed(_) => "Camera blocked",
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(
            self,
            HandStatus::NoHands | HandStatus::OneHand | HandStatus::TwoHands
        )
    }
}

/// Tracking settings (serialized in the settings file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSettings {
    /// Start with hand tracking on
    #[serde(rename = "enabled")]
    pub enabled: bool,
    /// Minimum spacing of published gesture states, in milliseconds
    #[serde(rename = "throttleMs")]
    pub throttle_ms: f64,
    #[serde(rename = "cameraIndex")]
    pub camera_index: u32,
    /// Hand presence score below which a frame has no hands
    #[serde(rename = "minHandScore")]
    pub min_hand_score: f32,
    /// Directory holding `hand_landmark.onnx`; searched for when absent
    #[serde(rename = "modelDir", skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
    /// Pause after a failed frame read, in milliseconds
    #[serde(rename = "errorBackoffMs")]
    pub error_backoff_ms: u64,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            throttle_ms: 12.0,
            camera_index: 0,
            min_hand_score: 0.5,
            model_dir: None,
            error_backoff_ms: 10,
        }
    }
}

impl TrackingSettings {
    pub fn validate(&mut self) {
        if !(self.throttle_ms.is_finite() && self.throttle_ms >= 0.0) {
            self.throttle_ms = Self::default().throttle_ms;
        }
        if !(0.0..=1.0).contains(&self.min_hand_score) {
            self.min_hand_score = Self::default().min_hand_score;
        }
    }
}
