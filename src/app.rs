//! Application state
//!
//! Wires hand tracking, input aggregation, the camera rig, and the demo
//! scene together. The host feeds window events and calls [`App::tick`]
//! once per frame; nothing here depends on a windowing backend.

use glam::Vec2;

use crate::gesture::GestureState;
use crate::input::InputAggregator;
use crate::rig::{CameraRig, RigEvent, RigFrame};
use crate::scene::{EntityId, SolarScene};
use crate::settings::Settings;
use crate::telemetry::{TickProfiler, TickStats};
use crate::tracking::{HandStatus, LandmarkSource, TrackingError, TrackingSession};

/// Creates a fresh landmark source each time hand tracking is enabled
pub type SourceFactory = Box<dyn Fn() -> Result<Box<dyn LandmarkSource>, TrackingError>>;

/// Per-frame output for the host
#[derive(Debug, Clone)]
pub struct AppFrame {
    pub rig: RigFrame,
    pub status: HandStatus,
    /// Hand cursor for an overlay, in unit-square screen coordinates
    pub cursor: Option<Vec2>,
}

/// Main application state
pub struct App {
    settings: Settings,
    scene: SolarScene,
    rig: CameraRig,
    input: InputAggregator,

    // Hand tracking
    source_factory: Option<SourceFactory>,
    session: Option<TrackingSession>,
    /// Last capture with its impulses spent, reused until the next one arrives
    held_gesture: Option<GestureState>,
    gesture_enabled: bool,
    status: HandStatus,

    // Frame timing
    last_elapsed: Option<f64>,
    profiler: TickProfiler,
}

impl App {
    /// Build the app; tracking starts when `settings.tracking.enabled` is set
    /// and a source factory is available
    pub fn new(settings: Settings, source_factory: Option<SourceFactory>) -> Self {
        let scene = SolarScene::new();
        let mut rig = CameraRig::new(settings.rig.clone());
        let initial = settings.initial_selection.trim();
        if !initial.is_empty() {
            match scene.entity_by_name(initial) {
                Some(id) => {
                    rig.set_selected(Some(id));
                }
                None => tracing::warn!(name = initial, "Unknown initial selection"),
            }
        }

        let mut app = Self {
            input: InputAggregator::new(settings.input.clone()),
            scene,
            rig,
            source_factory,
            session: None,
            held_gesture: None,
            gesture_enabled: false,
            status: HandStatus::Disabled,
            last_elapsed: None,
            profiler: TickProfiler::default(),
            settings,
        };

        if app.settings.tracking.enabled {
            app.set_gesture_enabled(true);
        }
        app
    }

    /// Turn hand tracking on or off.
    ///
    /// Enabling always starts a new session with fresh gesture history.
    /// A failed start is reported through [`App::status`] and leaves pointer
    /// input working.
    pub fn set_gesture_enabled(&mut self, enabled: bool) {
        // Stop first so a re-enable never shares a device with the old session
        if let Some(mut session) = self.session.take() {
            session.stop();
            tracing::info!("Hand tracking stopped");
        }
        self.held_gesture = None;
        self.gesture_enabled = enabled;

        if !enabled {
            self.status = HandStatus::Disabled;
            return;
        }

        let Some(factory) = self.source_factory.as_ref() else {
            self.status = HandStatus::Failed("no landmark source configured".to_string());
            tracing::warn!("Hand tracking requested but no landmark source is configured");
            return;
        };

        self.status = HandStatus::Initializing;
        let started = factory().and_then(|source| {
            TrackingSession::start(source, self.settings.gesture.clone(), &self.settings.tracking)
        });
        match started {
            Ok(session) => {
                tracing::info!(source = session.source_name(), "Hand tracking running");
                self.status = session.status();
                self.session = Some(session);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Hand tracking unavailable, pointer input only");
                self.status = HandStatus::Failed(e.to_string());
            }
        }
    }

    pub fn toggle_gesture(&mut self) {
        self.set_gesture_enabled(!self.gesture_enabled);
    }

    pub fn gesture_enabled(&self) -> bool {
        self.gesture_enabled
    }

    pub fn status(&self) -> &HandStatus {
        &self.status
    }

    pub fn pointer_down(&mut self) {
        self.input.pointer_down();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.input.pointer_move(Vec2::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.input.pointer_up();
    }

    /// Wheel delta in DOM convention (positive zooms out)
    pub fn wheel(&mut self, delta_y: f32) {
        self.input.wheel(delta_y);
    }

    /// Handle a viewport resize in physical pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.input.set_viewport(width as f32, height as f32);
        self.rig.set_aspect(width as f32 / height as f32);
    }

    /// Select a body by name, e.g. from a list
    pub fn select_by_name(&mut self, name: &str) -> Option<EntityId> {
        let id = self.scene.entity_by_name(name)?;
        if let Some(RigEvent::SelectionChanged(id)) = self.rig.set_selected(Some(id)) {
            tracing::info!(body = self.scene.name_of(id).unwrap_or("?"), "Selected");
        }
        Some(id)
    }

    pub fn reset_view(&mut self) {
        self.rig.reset();
    }

    /// Advance one frame; `elapsed` is seconds since the host started
    pub fn tick(&mut self, elapsed: f64) -> AppFrame {
        let dt = match self.last_elapsed {
            Some(last) => (elapsed - last) as f32,
            None => 0.0,
        };
        self.last_elapsed = Some(elapsed);
        self.profiler.record(dt);

        let gesture = self.next_gesture();
        if let Some(session) = &self.session {
            self.status = session.status();
        }

        let impulse = self.input.take_impulse(gesture.as_ref());
        self.scene.update(elapsed as f32);
        let frame = self.rig.tick(&impulse, dt, &self.scene);

        for event in &frame.events {
            match event {
                RigEvent::HoverChanged(Some(id)) => {
                    tracing::debug!(body = self.scene.name_of(*id).unwrap_or("?"), "Hover");
                }
                RigEvent::HoverChanged(None) => tracing::debug!("Hover cleared"),
                RigEvent::SelectionChanged(id) => {
                    tracing::info!(body = self.scene.name_of(*id).unwrap_or("?"), "Selected");
                }
            }
        }

        let cursor = gesture.and_then(|g| g.display_cursor(self.settings.mirror_cursor));
        AppFrame {
            rig: frame,
            status: self.status.clone(),
            cursor,
        }
    }

    /// Gesture input for this tick.
    ///
    /// A fresh capture is applied once. Ticks between captures see the same
    /// hands with no motion or pinch edge, so hover stays put and nothing is
    /// applied twice. Once the worker has exited the hands are gone.
    fn next_gesture(&mut self) -> Option<GestureState> {
        let session = self.session.as_ref()?;
        match session.take_latest() {
            Some(fresh) => {
                self.held_gesture = Some(fresh.held());
                Some(fresh)
            }
            None => {
                if !session.is_running() {
                    self.held_gesture = None;
                }
                self.held_gesture
            }
        }
    }

    /// Short status line for a title bar
    pub fn status_line(&self) -> String {
        let mut line = format!("Gesture Orbit | {}", self.status.label());
        if let Some(name) = self.rig.selected().and_then(|id| self.scene.name_of(id)) {
            line.push_str(&format!(" | {name}"));
        }
        if let Some(name) = self.rig.hovered().and_then(|id| self.scene.name_of(id)) {
            line.push_str(&format!(" | hover: {name}"));
        }
        line
    }

    /// Name of a scene entity
    pub fn body_name(&self, id: EntityId) -> Option<&'static str> {
        self.scene.name_of(id)
    }

    /// Whether the tracking worker is still reading frames
    pub fn tracking_active(&self) -> bool {
        self.session.as_ref().is_some_and(TrackingSession::is_running)
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn tick_stats(&self) -> TickStats {
        self.profiler.stats()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::estimator::fixtures::{hand_at, open_hand};
    use crate::hand::{HandFrame, LandmarkFrame};
    use crate::tracking::ReplaySource;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    struct Fixed {
        frames: Vec<LandmarkFrame>,
        fail: bool,
        /// After the last frame, keep reporting camera stalls instead of ending
        stall: bool,
    }

    impl LandmarkSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn open(&mut self) -> Result<(), TrackingError> {
            if self.fail {
                Err(TrackingError::DeviceUnavailable("blocked".into()))
            } else {
                Ok(())
            }
        }
        fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, TrackingError> {
            if !self.frames.is_empty() {
                Ok(Some(self.frames.remove(0)))
            } else if self.stall {
                std::thread::sleep(Duration::from_millis(1));
                Err(TrackingError::DeviceUnavailable("no frame".into()))
            } else {
                Ok(None)
            }
        }
        fn close(&mut self) {}
    }

    fn no_tracking() -> Settings {
        let mut settings = Settings::default();
        settings.tracking.enabled = false;
        settings
    }

    fn factory(frames: Vec<LandmarkFrame>, fail: bool) -> SourceFactory {
        stalling_factory(frames, fail, false)
    }

    fn stalling_factory(frames: Vec<LandmarkFrame>, fail: bool, stall: bool) -> SourceFactory {
        Box::new(move || {
            Ok(Box::new(Fixed {
                frames: frames.clone(),
                fail,
                stall,
            }) as Box<dyn LandmarkSource>)
        })
    }

    fn frame(timestamp_ms: f64, hand: HandFrame) -> LandmarkFrame {
        LandmarkFrame {
            timestamp_ms,
            hands: vec![hand],
        }
    }

    fn write_recording(name: &str, frames: &[LandmarkFrame]) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "gesture-orbit-app-{}-{}.jsonl",
            name,
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        for frame in frames {
            writeln!(file, "{}", serde_json::to_string(frame).unwrap()).unwrap();
        }
        path
    }

    fn wait_for_worker(app: &App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.tracking_active() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(!app.tracking_active());
    }

    #[test]
    fn test_initial_selection() {
        let app = App::new(no_tracking(), None);
        let earth = app.rig().selected().unwrap();
        assert_eq!(app.body_name(earth), Some("earth"));
        assert_eq!(app.status(), &HandStatus::Disabled);
    }

    #[test]
    fn test_pointer_drag_rotates() {
        let mut app = App::new(no_tracking(), None);
        app.resize(1000, 500);
        app.tick(0.0);
        let before = app.rig().state().theta;
        app.pointer_move(100.0, 100.0);
        app.pointer_down();
        app.pointer_move(200.0, 100.0);
        app.pointer_up();
        app.tick(0.016);
        assert!(app.rig().state().vel_theta > 0.0);
        assert!(app.rig().state().theta > before);
    }

    #[test]
    fn test_failed_source_keeps_pointer_input() {
        let mut settings = Settings::default();
        settings.tracking.enabled = true;
        let mut app = App::new(settings, Some(factory(Vec::new(), true)));
        assert!(matches!(app.status(), HandStatus::Failed(_)));
        assert_eq!(app.status().label(), "Camera blocked");
        assert!(app.gesture_enabled());

        app.tick(0.0);
        app.wheel(100.0);
        app.tick(0.016);
        assert!(app.rig().state().vel_radius > 0.0);
    }

    #[test]
    fn test_missing_factory_reports_failure() {
        let mut app = App::new(no_tracking(), None);
        app.set_gesture_enabled(true);
        assert!(matches!(app.status(), HandStatus::Failed(_)));
        app.set_gesture_enabled(false);
        assert_eq!(app.status(), &HandStatus::Disabled);
    }

    #[test]
    fn test_hand_cursor_hovers_selected_body() {
        // Index tip at the image centre; mirrored it is still the screen centre
        let frames = vec![frame(0.0, open_hand((0.5, 0.5)))];
        let mut app = App::new(no_tracking(), Some(factory(frames, false)));
        // Move the pose onto earth before the hand shows up
        app.tick(0.0);
        app.set_gesture_enabled(true);
        wait_for_worker(&app);

        let frame = app.tick(0.016);
        let earth = app.rig().selected().unwrap();
        assert_eq!(frame.rig.hovered, Some(earth));
        assert!(frame.cursor.unwrap().abs_diff_eq(Vec2::splat(0.5), 1e-6));
        assert!(app.status_line().contains("hover: earth"));

        // Stream over: the hand is gone on the next tick
        let frame = app.tick(0.032);
        assert_eq!(frame.rig.hovered, None);
        assert_eq!(frame.cursor, None);
        assert_eq!(frame.status, HandStatus::NoHands);

        app.set_gesture_enabled(false);
        assert_eq!(app.tick(0.048).status, HandStatus::Disabled);
    }

    #[test]
    fn test_pinch_selects_hovered_body() {
        let path = write_recording(
            "pinch",
            &[
                frame(0.0, open_hand((0.5, 0.5))),
                frame(16.0, hand_at((0.5, 0.5), 0.3)),
                frame(32.0, hand_at((0.5, 0.5), 0.3)),
            ],
        );
        let mut settings = no_tracking();
        settings.initial_selection = String::new();
        let replay = path.clone();
        let factory: SourceFactory = Box::new(move || {
            Ok(Box::new(ReplaySource::new(&replay)) as Box<dyn LandmarkSource>)
        });
        let mut app = App::new(settings, Some(factory));
        app.tick(0.0);
        assert_eq!(app.rig().selected(), None);
        app.set_gesture_enabled(true);
        wait_for_worker(&app);

        let mut selections = Vec::new();
        for i in 1..=120 {
            let frame = app.tick(i as f64 * 0.016);
            selections.extend(
                frame
                    .rig
                    .events
                    .iter()
                    .filter(|e| matches!(e, RigEvent::SelectionChanged(_)))
                    .cloned(),
            );
        }
        let sun = app.select_by_name("sun").unwrap();
        assert_eq!(selections, vec![RigEvent::SelectionChanged(sun)]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_gesture_applied_once_per_capture() {
        // One drag, then the camera goes quiet but stays open
        let frames = vec![
            frame(0.0, open_hand((0.4, 0.5))),
            frame(20.0, open_hand((0.6, 0.5))),
        ];
        let mut app = App::new(no_tracking(), Some(stalling_factory(frames, false, true)));
        app.tick(0.0);
        app.set_gesture_enabled(true);

        let deadline = Instant::now() + Duration::from_secs(5);
        while app.rig().state().vel_theta == 0.0 && Instant::now() < deadline {
            app.tick(0.0);
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(app.tracking_active());
        let mut prev = app.rig().state().vel_theta.abs();
        assert!(prev > 0.1);

        let mut last = None;
        for i in 1..=600 {
            let frame = app.tick(i as f64 * 0.016);
            let v = app.rig().state().vel_theta.abs();
            assert!(v < prev, "tick {i}: {v} >= {prev}");
            prev = v;
            last = Some(frame);
        }
        assert!(prev < 1e-6);
        // Hands are still in view between captures
        assert!(last.unwrap().cursor.is_some());
    }

    #[test]
    fn test_select_by_name() {
        let mut app = App::new(no_tracking(), None);
        let mars = app.select_by_name("Mars").unwrap();
        assert_eq!(app.rig().selected(), Some(mars));
        assert_eq!(app.select_by_name("pluto"), None);
    }
}
