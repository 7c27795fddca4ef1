//! ML inference module
//!
//! Hand landmark detection with ONNX Runtime, using the MediaPipe-compatible
//! `hand_landmark.onnx` model from the PINTO Model Zoo. The model sees the
//! whole frame and reports at most one hand.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ndarray::Array4;

use crate::camera::{CameraCapture, CameraFrame, FrameWait};
use crate::hand::{HandFrame, Landmark, LandmarkFrame, LANDMARK_COUNT};
use crate::tracking::{LandmarkSource, TrackingError, TrackingSettings};

const MODEL_FILE: &str = "hand_landmark.onnx";
const INPUT_SIZE: u32 = 224;
/// How long `next_frame` waits for the camera before reporting a stall
const FRAME_TIMEOUT: Duration = Duration::from_secs(1);

/// Hand landmark model session
pub struct HandLandmarker {
    session: ort::session::Session,
    min_score: f32,
}

impl HandLandmarker {
    /// Load the model from `model_dir`, or from the first `models` directory found
    pub fn load(model_dir: Option<&Path>, min_score: f32) -> Result<Self, TrackingError> {
        let model_dir = match model_dir {
            Some(dir) => dir.to_path_buf(),
            None => find_model_dir()?,
        };
        let model_path = model_dir.join(MODEL_FILE);
        if !model_path.exists() {
            return Err(TrackingError::ModelUnavailable(format!(
                "{} not found",
                model_path.display()
            )));
        }

        ort::init()
            .with_name("GestureOrbit")
            .commit()
            .map_err(|e| {
                TrackingError::ModelUnavailable(format!("failed to initialize ONNX Runtime: {e}"))
            })?;

        let session = ort::session::Session::builder()
            .and_then(|b| b.with_intra_threads(2))
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| {
                TrackingError::ModelUnavailable(format!(
                    "failed to load {}: {e}",
                    model_path.display()
                ))
            })?;

        tracing::info!(path = %model_path.display(), "Loaded hand landmark model");
        Ok(Self { session, min_score })
    }

    /// Detect a hand; `None` when the presence score is below the threshold
    pub fn detect(&mut self, frame: &CameraFrame) -> Result<Option<HandFrame>, TrackingError> {
        let input = preprocess_nhwc(frame, INPUT_SIZE, INPUT_SIZE);
        let side = INPUT_SIZE as usize;
        let input_array = Array4::from_shape_vec((1, side, side, 3), input)
            .map_err(|e| TrackingError::Inference(format!("failed to create input array: {e}")))?;
        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| TrackingError::Inference(format!("failed to create tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| TrackingError::Inference(e.to_string()))?;

        // Output 0: 21 × (x, y, z) in input pixels; output 1: hand presence score
        let mut outputs = outputs.iter();
        let (_, landmarks) = outputs
            .next()
            .ok_or_else(|| TrackingError::Inference("model produced no landmark output".into()))?;
        let (_, score) = outputs
            .next()
            .ok_or_else(|| TrackingError::Inference("model produced no score output".into()))?;

        let (_, score) = score
            .try_extract_tensor::<f32>()
            .map_err(|e| TrackingError::Inference(format!("failed to extract score: {e}")))?;
        let score = score.first().copied().unwrap_or(0.0);
        if score < self.min_score {
            return Ok(None);
        }

        let (_, points) = landmarks
            .try_extract_tensor::<f32>()
            .map_err(|e| TrackingError::Inference(format!("failed to extract landmarks: {e}")))?;
        Ok(decode_landmarks(points, INPUT_SIZE as f32))
    }
}

/// Convert flat model output into a normalized hand
fn decode_landmarks(points: &[f32], input_size: f32) -> Option<HandFrame> {
    if points.len() < LANDMARK_COUNT * 3 {
        return None;
    }
    let mut hand = HandFrame::default();
    for (landmark, xyz) in hand.landmarks.iter_mut().zip(points.chunks_exact(3)) {
        *landmark = Landmark {
            x: xyz[0] / input_size,
            y: xyz[1] / input_size,
            z: Some(xyz[2] / input_size),
        };
    }
    Some(hand)
}

/// Resize and convert an RGBA frame to NHWC float [0, 1]
fn preprocess_nhwc(frame: &CameraFrame, target_width: u32, target_height: u32) -> Vec<f32> {
    let mut output = vec![0.0f32; (target_width * target_height * 3) as usize];
    if frame.width == 0 || frame.height == 0 {
        return output;
    }

    let x_ratio = frame.width as f32 / target_width as f32;
    let y_ratio = frame.height as f32 / target_height as f32;

    for y in 0..target_height {
        for x in 0..target_width {
            let src_x = (x as f32 * x_ratio) as u32;
            let src_y = (y as f32 * y_ratio) as u32;
            let src_idx = ((src_y * frame.width + src_x) * 4) as usize;

            if src_idx + 2 < frame.data.len() {
                let out_idx = ((y * target_width + x) * 3) as usize;
                output[out_idx] = frame.data[src_idx] as f32 / 255.0;
                output[out_idx + 1] = frame.data[src_idx + 1] as f32 / 255.0;
                output[out_idx + 2] = frame.data[src_idx + 2] as f32 / 255.0;
            }
        }
    }

    output
}

/// Find the models directory next to the executable or the working directory
fn find_model_dir() -> Result<PathBuf, TrackingError> {
    let mut candidates = Vec::new();
    if let Ok(exe_path) = std::env::current_exe() {
        // Also walk up out of target/{debug,release}
        candidates.extend(exe_path.ancestors().skip(1).take(3).map(|dir| dir.join("models")));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("models"));
    }

    candidates
        .into_iter()
        .find(|dir| dir.is_dir())
        .ok_or_else(|| {
            TrackingError::ModelUnavailable(format!(
                "models directory not found; place {MODEL_FILE} in ./models"
            ))
        })
}

/// Live webcam landmark source
pub struct WebcamLandmarkSource {
    camera_index: u32,
    model_dir: Option<PathBuf>,
    min_score: f32,
    name: String,
    capture: Option<CameraCapture>,
    landmarker: Option<HandLandmarker>,
    started: Instant,
}

impl WebcamLandmarkSource {
    pub fn new(settings: &TrackingSettings) -> Self {
        Self {
            camera_index: settings.camera_index,
            model_dir: settings.model_dir.clone(),
            min_score: settings.min_hand_score,
            name: format!("webcam:{}", settings.camera_index),
            capture: None,
            landmarker: None,
            started: Instant::now(),
        }
    }
}

impl LandmarkSource for WebcamLandmarkSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), TrackingError> {
        // Model before camera
        self.landmarker = Some(HandLandmarker::load(self.model_dir.as_deref(), self.min_score)?);
        let capture = CameraCapture::open(self.camera_index)?;
        let (width, height) = capture.resolution();
        tracing::info!(camera = self.camera_index, width, height, "Webcam landmark source open");
        self.capture = Some(capture);
        self.started = Instant::now();
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, TrackingError> {
        let (Some(capture), Some(landmarker)) =
            (self.capture.as_ref(), self.landmarker.as_mut())
        else {
            return Ok(None);
        };

        let frame = match capture.next_frame(FRAME_TIMEOUT) {
            FrameWait::Frame(frame) => frame,
            FrameWait::TimedOut => {
                return Err(TrackingError::DeviceUnavailable("no frame from camera".into()));
            }
            FrameWait::Closed => return Ok(None),
        };

        let timestamp_ms = frame.timestamp.duration_since(self.started).as_secs_f64() * 1000.0;
        let hands = landmarker.detect(&frame)?.into_iter().collect();
        Ok(Some(LandmarkFrame { timestamp_ms, hands }))
    }

    fn close(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
            tracing::debug!(frames = capture.frame_count(), "Webcam capture closed");
        }
        self.landmarker = None;
    }
}
