use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;
use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::{InputAction, InputSnapshot, MetricsHandle, Renderer, Scene, SceneCommand, SceneWorld};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Upper bound on the per-frame clock advance.
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Dungeon".to_string(),
            window_width: 1380,
            window_height: 850,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, scene: Box<dyn Scene>) -> Result<(), AppError> {
    let metrics_handle = MetricsHandle::default();
    run_app_with_metrics(config, scene, metrics_handle)
}

/// Runs one scene update per rendered frame until the window closes or the
/// scene asks to quit.
pub fn run_app_with_metrics(
    config: LoopConfig,
    mut scene: Box<dyn Scene>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let initial_size = window.inner_size();
    let mut input_collector = InputCollector::new(initial_size.width, initial_size.height);

    let mut world = SceneWorld::default();
    scene.load(&mut world);
    info!(entity_count = world.entity_count(), "scene_loaded");

    info!(
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut game_clock = GameClock::new(max_frame_delta);
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut scene_loaded = true;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let is_pressed = event.state == ElementState::Pressed;
                    input_collector.update_action_state_from_physical_key(
                        event.physical_key,
                        is_pressed,
                    );
                    if input_collector.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let frame = game_clock.advance(now);

                    let input_snapshot = input_collector.snapshot_for_frame();
                    let command = scene.update(frame.elapsed_seconds, &input_snapshot, &mut world);
                    if command == SceneCommand::Quit {
                        info!(reason = "scene_request", "shutdown_requested");
                        window_target.exit();
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    scene.render(&world);
                    if let Err(error) = renderer.render_world(&world) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = scene.debug_title(&world);
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }

                    metrics_accumulator.record_frame(frame.raw_delta, frame.was_clamped);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_time_ms = snapshot.worst_frame_time_ms,
                            clamped_frames = snapshot.clamped_frames,
                            entity_count = world.entity_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                if scene_loaded {
                    scene.unload(&mut world);
                    world.clear();
                    scene_loaded = false;
                }
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Monotonic time handed to the scene. Advances by the wall-clock frame
/// delta, capped per frame so a stall cannot teleport the player.
#[derive(Debug)]
struct GameClock {
    last_sample: Option<Instant>,
    elapsed: Duration,
    max_frame_delta: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameTiming {
    elapsed_seconds: f32,
    raw_delta: Duration,
    was_clamped: bool,
}

impl GameClock {
    fn new(max_frame_delta: Duration) -> Self {
        Self {
            last_sample: None,
            elapsed: Duration::ZERO,
            max_frame_delta,
        }
    }

    fn advance(&mut self, now: Instant) -> FrameTiming {
        let raw_delta = match self.last_sample {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.last_sample = Some(now);
        let clamped = clamp_frame_delta(raw_delta, self.max_frame_delta);
        self.elapsed = self.elapsed.saturating_add(clamped);
        FrameTiming {
            elapsed_seconds: self.elapsed.as_secs_f32(),
            raw_delta,
            was_clamped: clamped < raw_delta,
        }
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    /// Snapshot for one frame; press/release edges are consumed.
    fn snapshot_for_frame(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.cursor_position_px,
            self.left_mouse_is_down,
            self.window_width,
            self.window_height,
        );
        self.action_states.clear_edges();
        snapshot
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(action) = action_for_key(code) else {
            return;
        };
        self.action_states.set(action, is_pressed);
        if action == InputAction::Quit && is_pressed {
            self.mark_quit_requested();
        }
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2::new(x, y));
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.left_mouse_is_down = state == ElementState::Pressed;
        }
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    let action = match code {
        KeyCode::KeyW => InputAction::MoveForward,
        KeyCode::KeyS => InputAction::MoveBack,
        KeyCode::KeyA => InputAction::StrafeLeft,
        KeyCode::KeyD => InputAction::StrafeRight,
        KeyCode::ArrowLeft => InputAction::LookLeft,
        KeyCode::ArrowRight => InputAction::LookRight,
        KeyCode::ArrowUp => InputAction::LookUp,
        KeyCode::ArrowDown => InputAction::LookDown,
        KeyCode::KeyQ => InputAction::RollLeft,
        KeyCode::KeyE => InputAction::RollRight,
        KeyCode::KeyP => InputAction::Interact,
        KeyCode::Escape => InputAction::Quit,
        _ => return None,
    };
    Some(action)
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);
        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn game_clock_starts_at_zero_and_accumulates_clamped_deltas() {
        let mut clock = GameClock::new(Duration::from_millis(250));
        let base = Instant::now();

        let first = clock.advance(base);
        assert_eq!(first.elapsed_seconds, 0.0);
        assert!(!first.was_clamped);

        let second = clock.advance(base + Duration::from_millis(100));
        assert!((second.elapsed_seconds - 0.1).abs() < 1e-6);

        let stalled = clock.advance(base + Duration::from_millis(1100));
        assert!(stalled.was_clamped);
        assert_eq!(stalled.raw_delta, Duration::from_millis(1000));
        assert!((stalled.elapsed_seconds - 0.35).abs() < 1e-6);
    }

    #[test]
    fn game_clock_never_runs_backwards() {
        let mut clock = GameClock::new(Duration::from_millis(250));
        let base = Instant::now() + Duration::from_secs(1);
        clock.advance(base);
        let earlier = clock.advance(base - Duration::from_millis(500));
        assert_eq!(earlier.raw_delta, Duration::ZERO);
        assert_eq!(earlier.elapsed_seconds, 0.0);
    }

    #[test]
    fn render_cap_helpers_ignore_zero_and_compute_sleep() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
        let target = target_frame_duration(Some(50));
        assert_eq!(target, Some(Duration::from_millis(20)));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(5), target),
            Duration::from_millis(15)
        );
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(30), target),
            Duration::ZERO
        );
        assert_eq!(compute_cap_sleep(Duration::from_millis(5), None), Duration::ZERO);
        assert_eq!(format_render_cap(None), "off");
    }

    #[test]
    fn zero_durations_fall_back() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_secs(1)),
            Duration::from_secs(1)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(5), Duration::from_secs(1)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn movement_and_look_keys_map_to_actions() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyW), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyE), true);
        let snapshot = input.snapshot_for_frame();
        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(snapshot.is_down(InputAction::LookLeft));
        assert!(snapshot.is_down(InputAction::RollRight));
        assert!(!snapshot.is_down(InputAction::MoveBack));
    }

    #[test]
    fn interact_press_edge_lasts_one_frame() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyP), true);
        let first = input.snapshot_for_frame();
        // Key repeat delivers another pressed event while held.
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyP), true);
        let second = input.snapshot_for_frame();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyP), false);
        let third = input.snapshot_for_frame();

        assert!(first.was_pressed(InputAction::Interact));
        assert!(second.is_down(InputAction::Interact));
        assert!(!second.was_pressed(InputAction::Interact));
        assert!(third.was_released(InputAction::Interact));
        assert!(!third.is_down(InputAction::Interact));
    }

    #[test]
    fn escape_requests_quit() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Escape), true);
        assert!(input.snapshot_for_frame().quit_requested());
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::F5), true);
        let snapshot = input.snapshot_for_frame();
        assert!(!snapshot.quit_requested());
        assert!(!snapshot.is_down(InputAction::Interact));
    }

    #[test]
    fn left_mouse_controls_look_drag() {
        let mut input = InputCollector::new(1380, 850);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(input.snapshot_for_frame().look_drag_held());
        input.handle_mouse_input(MouseButton::Right, ElementState::Released);
        assert!(input.snapshot_for_frame().look_drag_held());
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        assert!(!input.snapshot_for_frame().look_drag_held());
    }

    #[test]
    fn snapshot_carries_cursor_and_window_size() {
        let mut input = InputCollector::new(1380, 850);
        input.set_cursor_position_px(100.0, 200.0);
        let snapshot = input.snapshot_for_frame();
        assert_eq!(snapshot.window_size(), (1380, 850));
        let cursor = snapshot.cursor_position_px().expect("cursor");
        assert!((cursor.x - 100.0).abs() < 0.0001);
        assert!((cursor.y - 200.0).abs() < 0.0001);

        input.clear_cursor_position();
        assert!(input.snapshot_for_frame().cursor_position_px().is_none());
    }
}
