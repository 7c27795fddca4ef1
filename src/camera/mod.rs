//! Webcam capture
//!
//! Captures RGBA frames with nokhwa on a background thread. The device is
//! opened on that thread and the outcome is reported back before `open`
//! returns, so a missing or blocked camera surfaces as an error.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::tracking::TrackingError;

/// One captured RGBA frame
#[derive(Clone)]
pub struct CameraFrame {
    /// Row-major RGBA, 4 bytes per pixel
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_number: u64,
    pub timestamp: Instant,
}

/// A camera reported by the platform backend
#[derive(Clone, Debug)]
pub struct CameraInfo {
    pub index: u32,
    pub name: String,
}

/// Outcome of waiting for a frame
pub enum FrameWait {
    Frame(CameraFrame),
    TimedOut,
    /// Capture thread has exited
    Closed,
}

/// Running camera capture
pub struct CameraCapture {
    frames: Receiver<CameraFrame>,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
    resolution: (u32, u32),
    frame_count: Arc<AtomicU64>,
}

impl CameraCapture {
    /// List available cameras
    pub fn list_cameras() -> Vec<CameraInfo> {
        match nokhwa::query(nokhwa::utils::ApiBackend::Auto) {
            Ok(list) => list
                .iter()
                .enumerate()
                .map(|(idx, info)| CameraInfo {
                    index: idx as u32,
                    name: info.human_name().to_string(),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to enumerate cameras");
                Vec::new()
            }
        }
    }

    /// Open camera `camera_index` and start streaming
    pub fn open(camera_index: u32) -> Result<Self, TrackingError> {
        let running = Arc::new(AtomicBool::new(true));
        let frame_count = Arc::new(AtomicU64::new(0));
        // Two frames of slack; older frames are dropped while inference is busy
        let (frame_tx, frame_rx) = bounded::<CameraFrame>(2);
        let (ready_tx, ready_rx) = bounded::<Result<(u32, u32), String>>(1);

        let running_clone = running.clone();
        let frame_count_clone = frame_count.clone();
        let thread_handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || {
                Self::capture_thread(
                    camera_index,
                    frame_tx,
                    ready_tx,
                    running_clone,
                    frame_count_clone,
                );
            })
            .map_err(TrackingError::WorkerSpawn)?;

        let mut capture = Self {
            frames: frame_rx,
            running,
            thread_handle: Some(thread_handle),
            resolution: (0, 0),
            frame_count,
        };

        match ready_rx.recv() {
            Ok(Ok(resolution)) => {
                capture.resolution = resolution;
                Ok(capture)
            }
            Ok(Err(reason)) => {
                capture.stop();
                Err(TrackingError::DeviceUnavailable(reason))
            }
            Err(_) => {
                capture.stop();
                Err(TrackingError::DeviceUnavailable(
                    "capture thread exited during startup".to_string(),
                ))
            }
        }
    }

    fn open_camera(camera_index: u32) -> Result<Camera, String> {
        let index = CameraIndex::Index(camera_index);
        let attempts = [
            RequestedFormatType::AbsoluteHighestResolution,
            RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
            RequestedFormatType::None,
        ];

        let mut last_error = String::from("no capture format accepted");
        for format in attempts {
            let requested = RequestedFormat::new::<RgbAFormat>(format);
            match Camera::new(index.clone(), requested) {
                Ok(camera) => return Ok(camera),
                Err(e) => {
                    tracing::debug!(error = ?e, "Camera format rejected, trying next");
                    last_error = e.to_string();
                }
            }
        }
        Err(last_error)
    }

    fn capture_thread(
        camera_index: u32,
        frames: Sender<CameraFrame>,
        ready: Sender<Result<(u32, u32), String>>,
        running: Arc<AtomicBool>,
        frame_count: Arc<AtomicU64>,
    ) {
        tracing::info!(camera = camera_index, "Starting camera capture thread");

        let mut camera = match Self::open_camera(camera_index) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(camera = camera_index, error = %e, "Failed to open camera");
                let _ = ready.send(Err(e));
                return;
            }
        };

        if let Err(e) = camera.open_stream() {
            tracing::error!(error = ?e, "Failed to open camera stream");
            let _ = ready.send(Err(e.to_string()));
            return;
        }

        let resolution = (camera.resolution().width(), camera.resolution().height());
        tracing::info!(
            name = %camera.info().human_name(),
            width = resolution.0,
            height = resolution.1,
            "Camera opened"
        );
        let _ = ready.send(Ok(resolution));

        while running.load(Ordering::Acquire) {
            match camera.frame() {
                Ok(frame) => match frame.decode_image::<RgbAFormat>() {
                    Ok(image) => {
                        let camera_frame = CameraFrame {
                            width: image.width(),
                            height: image.height(),
                            data: image.into_raw(),
                            frame_number: frame_count.fetch_add(1, Ordering::Relaxed),
                            timestamp: Instant::now(),
                        };
                        // Full channel: the consumer is behind, drop this frame
                        let _ = frames.try_send(camera_frame);
                    }
                    Err(e) => tracing::warn!(error = ?e, "Failed to decode frame"),
                },
                Err(e) => {
                    tracing::warn!(error = ?e, "Failed to capture frame");
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
        }

        if let Err(e) = camera.stop_stream() {
            tracing::warn!(error = ?e, "Failed to stop camera stream");
        }
        tracing::info!("Camera capture thread stopped");
    }

    /// Wait up to `timeout` for the next frame
    pub fn next_frame(&self, timeout: Duration) -> FrameWait {
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => FrameWait::Frame(frame),
            Err(RecvTimeoutError::Timeout) => FrameWait::TimedOut,
            Err(RecvTimeoutError::Disconnected) => FrameWait::Closed,
        }
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Stop capturing and release the device
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
