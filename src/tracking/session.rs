//! Tracking worker thread
//!
//! Owns a landmark source and a gesture tracker for the lifetime of one
//! enable/disable cycle. The source is opened on the worker; the result is
//! handed back to `start` before any frame is read.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use super::throttle::EmissionThrottle;
use super::{HandStatus, LandmarkSource, SourceGuard, TrackingError, TrackingSettings};
use crate::gesture::{GestureState, GestureTracker, GestureTuning};

/// State shared between the worker and the render thread
struct Shared {
    /// Published and not yet consumed
    latest: Mutex<Option<GestureState>>,
    status: Mutex<HandStatus>,
    running: AtomicBool,
    finished: AtomicBool,
    frames: AtomicU64,
    published: AtomicU64,
}

/// A running hand tracking session
pub struct TrackingSession {
    shared: Arc<Shared>,
    source_name: String,
    thread_handle: Option<JoinHandle<()>>,
}

impl TrackingSession {
    /// Spawn the worker, open the source on it, and wait for the result.
    ///
    /// On failure the source has already been closed when this returns.
    pub fn start(
        source: Box<dyn LandmarkSource>,
        tuning: GestureTuning,
        settings: &TrackingSettings,
    ) -> Result<Self, TrackingError> {
        let source_name = source.name().to_string();
        let shared = Arc::new(Shared {
            latest: Mutex::new(None),
            status: Mutex::new(HandStatus::Initializing),
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            frames: AtomicU64::new(0),
            published: AtomicU64::new(0),
        });

        let (ready_tx, ready_rx) = bounded::<Result<(), TrackingError>>(1);
        let worker = Worker {
            shared: shared.clone(),
            tracker: GestureTracker::new(tuning),
            throttle: EmissionThrottle::new(settings.throttle_ms),
            backoff: Duration::from_millis(settings.error_backoff_ms),
            last_frame: None,
        };

        tracing::info!(source = %source_name, "Starting hand tracking");
        let thread_handle = std::thread::Builder::new()
            .name("hand-tracking".to_string())
            .spawn(move || worker.run(source, ready_tx))
            .map_err(TrackingError::WorkerSpawn)?;

        let mut session = Self {
            shared,
            source_name,
            thread_handle: Some(thread_handle),
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(session),
            Ok(Err(e)) => {
                session.join();
                Err(e)
            }
            Err(_) => {
                session.join();
                Err(TrackingError::WorkerExited)
            }
        }
    }

    /// Take the gesture state published since the last call, if any.
    ///
    /// Each published state is returned once; states published between two
    /// calls arrive coalesced into the newest one.
    pub fn take_latest(&self) -> Option<GestureState> {
        self.shared.latest.lock().take()
    }

    pub fn status(&self) -> HandStatus {
        self.shared.status.lock().clone()
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// False once the worker has exited (stopped or end of stream)
    pub fn is_running(&self) -> bool {
        !self.shared.finished.load(Ordering::Acquire)
    }

    /// Frames read from the source
    pub fn frame_count(&self) -> u64 {
        self.shared.frames.load(Ordering::Relaxed)
    }

    /// Gesture states that passed the throttle
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Relaxed)
    }

    /// Signal the worker and wait for it; the source is released on return
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.join();
        *self.shared.latest.lock() = None;
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::error!(source = %self.source_name, "Hand tracking thread panicked");
            }
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    shared: Arc<Shared>,
    tracker: GestureTracker,
    throttle: EmissionThrottle<GestureState>,
    backoff: Duration,
    /// Timestamp of the last frame and when it was read
    last_frame: Option<(f64, Instant)>,
}

impl Worker {
    fn run(mut self, source: Box<dyn LandmarkSource>, ready: Sender<Result<(), TrackingError>>) {
        let mut guard = SourceGuard::new(source);

        if let Err(e) = guard.source_mut().open() {
            tracing::warn!(
                source = guard.source_mut().name(),
                error = %e,
                "Failed to open landmark source"
            );
            *self.shared.status.lock() = HandStatus::Failed(e.to_string());
            self.shared.finished.store(true, Ordering::Release);
            drop(guard);
            let _ = ready.send(Err(e));
            return;
        }

        *self.shared.status.lock() = HandStatus::NoHands;
        let _ = ready.send(Ok(()));
        tracing::info!(source = guard.source_mut().name(), "Hand tracking thread started");

        while self.shared.running.load(Ordering::Acquire) {
            match guard.source_mut().next_frame() {
                Ok(Some(frame)) => {
                    self.shared.frames.fetch_add(1, Ordering::Relaxed);
                    self.last_frame = Some((frame.timestamp_ms, Instant::now()));
                    let state = self.tracker.update(&frame.hands, frame.timestamp_ms);
                    *self.shared.status.lock() = HandStatus::from_hands_count(state.hands_count);
                    if let Some(out) = self.throttle.offer(state, frame.timestamp_ms) {
                        self.publish(out);
                    }
                }
                Ok(None) => {
                    tracing::info!("Landmark stream ended");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping landmark frame");
                    std::thread::sleep(self.backoff);
                    // A stalled source must not hold back the last state
                    if let Some(now_ms) = self.frame_clock() {
                        if let Some(out) = self.throttle.flush(now_ms) {
                            self.publish(out);
                        }
                    }
                }
            }
        }

        if let Some(out) = self.throttle.take_pending() {
            self.publish(out);
        }
        self.tracker.reset();
        *self.shared.status.lock() = HandStatus::NoHands;
        self.shared.finished.store(true, Ordering::Release);
        tracing::info!(
            frames = self.shared.frames.load(Ordering::Relaxed),
            "Hand tracking thread stopped"
        );
    }

    /// Frame clock extrapolated from the last frame by wall time
    fn frame_clock(&self) -> Option<f64> {
        self.last_frame
            .map(|(timestamp_ms, read_at)| timestamp_ms + read_at.elapsed().as_secs_f64() * 1000.0)
    }

    fn publish(&self, mut state: GestureState) {
        let mut slot = self.shared.latest.lock();
        if let Some(unread) = slot.take() {
            state.absorb(&unread);
        }
        *slot = Some(state);
        self.shared.published.fetch_add(1, Ordering::Relaxed);
    }
}
