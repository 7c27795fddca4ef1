//! Gesture Orbit - Main Entry Point
//!
//! Desktop host for the orbit rig: a winit window whose title shows the
//! tracking status and selection, or a headless loop for recorded sessions.

mod args;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use gesture_orbit::app::{App, SourceFactory};
use gesture_orbit::scene::solar::BODIES;
use gesture_orbit::settings::Settings;
use gesture_orbit::telemetry::{init_logging, LogConfig};
use gesture_orbit::tracking::{LandmarkSource, ReplaySource};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use args::Args;

const WINDOW_TITLE: &str = "Gesture Orbit";
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const TARGET_FPS: u32 = 60;

/// Application state machine
enum AppState {
    /// Waiting for the event loop to resume
    Uninitialized(Option<App>),
    Running { window: Arc<Window>, app: App },
}

/// Main application handler implementing winit's ApplicationHandler trait
struct GestureOrbitApp {
    state: AppState,
    started: Instant,
    next_redraw_at: Instant,
    title: String,
}

impl GestureOrbitApp {
    fn new(app: App) -> Self {
        Self {
            state: AppState::Uninitialized(Some(app)),
            started: Instant::now(),
            next_redraw_at: Instant::now(),
            title: String::new(),
        }
    }
}

impl ApplicationHandler for GestureOrbitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Uninitialized(pending) = &mut self.state else {
            return;
        };
        let Some(mut app) = pending.take() else {
            return;
        };

        let window_attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create window");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        app.resize(size.width, size.height);
        tracing::info!(width = size.width, height = size.height, "Window created");
        tracing::info!(
            "Drag to orbit, scroll to zoom, H toggles hands, R resets, 1-9 select, ESC exits"
        );

        self.started = Instant::now();
        self.next_redraw_at = self.started;
        self.state = AppState::Running { window, app };
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let AppState::Running { window, app } = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::F11 => {
                    if window.fullscreen().is_some() {
                        window.set_fullscreen(None);
                    } else {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    }
                }
                KeyCode::KeyH => app.toggle_gesture(),
                KeyCode::KeyR => app.reset_view(),
                key => {
                    if let Some(index) = digit_index(key) {
                        if let Some(body) = BODIES.get(index) {
                            app.select_by_name(body.name);
                        }
                    }
                }
            },

            WindowEvent::Resized(size) => app.resize(size.width, size.height),

            WindowEvent::CursorMoved { position, .. } => {
                app.pointer_move(position.x as f32, position.y as f32);
            }

            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => app.pointer_down(),
                ElementState::Released => app.pointer_up(),
            },

            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scroll-up as positive; the rig expects DOM deltas
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                app.wheel(delta_y);
            }

            WindowEvent::RedrawRequested => {
                app.tick(self.started.elapsed().as_secs_f64());
                let title = app.status_line();
                if title != self.title {
                    window.set_title(&title);
                    self.title = title;
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Running { window, .. } = &self.state else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        let frame_duration = Duration::from_nanos(1_000_000_000u64 / TARGET_FPS as u64);
        let now = Instant::now();
        if now >= self.next_redraw_at {
            window.request_redraw();
            self.next_redraw_at += frame_duration;
            // Reset if too far behind
            if now > self.next_redraw_at + frame_duration * 2 {
                self.next_redraw_at = now + frame_duration;
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_redraw_at));
    }
}

fn digit_index(key: KeyCode) -> Option<usize> {
    let digits = [
        KeyCode::Digit1,
        KeyCode::Digit2,
        KeyCode::Digit3,
        KeyCode::Digit4,
        KeyCode::Digit5,
        KeyCode::Digit6,
        KeyCode::Digit7,
        KeyCode::Digit8,
        KeyCode::Digit9,
    ];
    digits.iter().position(|&d| d == key)
}

/// Pick the landmark source: a replay file when given, else the webcam
fn source_factory(args: &Args, settings: &Settings) -> Option<SourceFactory> {
    if let Some(path) = args.replay.clone() {
        let looping = args.loop_replay;
        return Some(Box::new(move || {
            let source = ReplaySource::new(&path).paced(true).looping(looping);
            Ok(Box::new(source) as Box<dyn LandmarkSource>)
        }));
    }
    webcam_factory(settings)
}

#[cfg(feature = "webcam")]
fn webcam_factory(settings: &Settings) -> Option<SourceFactory> {
    let tracking = settings.tracking.clone();
    Some(Box::new(move || {
        let source = gesture_orbit::ml::WebcamLandmarkSource::new(&tracking);
        Ok(Box::new(source) as Box<dyn LandmarkSource>)
    }))
}

#[cfg(not(feature = "webcam"))]
fn webcam_factory(_settings: &Settings) -> Option<SourceFactory> {
    Some(Box::new(|| {
        Err(gesture_orbit::tracking::TrackingError::DeviceUnavailable(
            "built without webcam support; use --replay or enable the `webcam` feature".to_string(),
        ))
    }))
}

/// Print the cameras when asked; returns whether the run should stop
#[cfg(feature = "webcam")]
fn list_cameras(args: &Args) -> bool {
    if !args.list_cameras {
        return false;
    }
    for camera in gesture_orbit::camera::CameraCapture::list_cameras() {
        println!("{}: {}", camera.index, camera.name);
    }
    true
}

#[cfg(not(feature = "webcam"))]
fn list_cameras(_args: &Args) -> bool {
    false
}

fn load_settings(args: &Args) -> Settings {
    match Settings::load_or_default(args.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid settings file, using defaults");
            Settings::default()
        }
    }
}

fn run_headless(mut app: App, seconds: f64) {
    let frame_duration = Duration::from_secs_f64(1.0 / TARGET_FPS as f64);
    let started = Instant::now();
    let mut last_status = String::new();

    tracing::info!(seconds, "Running headless");
    while started.elapsed().as_secs_f64() < seconds {
        let frame = app.tick(started.elapsed().as_secs_f64());
        let status = app.status_line();
        if status != last_status {
            tracing::info!(status = %status, hands = frame.status.label(), "Status");
            last_status = status;
        }
        std::thread::sleep(frame_duration);
    }

    let stats = app.tick_stats();
    let state = app.rig().state();
    tracing::info!(
        ticks = stats.sample_count,
        fps = stats.fps(),
        p95_ms = stats.p95_ms,
        theta = state.theta,
        phi = state.phi,
        radius = state.radius,
        selected = app.rig().selected().and_then(|id| app.body_name(id)),
        "Headless run finished"
    );
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let log_config = LogConfig {
        json_format: args.log_json,
        file_path: args.log_file.clone(),
        ..LogConfig::default()
    };
    let _log_guard = init_logging(&log_config)?;

    tracing::info!("Gesture Orbit v{}", env!("CARGO_PKG_VERSION"));

    if list_cameras(&args) {
        return Ok(());
    }

    let mut settings = load_settings(&args);
    if let Some(camera) = args.camera {
        settings.tracking.camera_index = camera;
    }
    if args.no_hands {
        settings.tracking.enabled = false;
    }

    if args.write_settings {
        let path: PathBuf = match args.settings.clone() {
            Some(path) => path,
            None => Settings::default_path().ok_or("no config directory")?,
        };
        settings.save_to_file(&path)?;
        tracing::info!(path = %path.display(), "Settings written");
        return Ok(());
    }

    let factory = source_factory(&args, &settings);
    let app = App::new(settings, factory);

    if let Some(seconds) = args.headless {
        run_headless(app, seconds);
        return Ok(());
    }

    let event_loop = EventLoop::new().map_err(|e| format!("failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Wait);
    let mut handler = GestureOrbitApp::new(app);
    event_loop
        .run_app(&mut handler)
        .map_err(|e| format!("event loop error: {e}"))?;
    Ok(())
}
