// SPDX-License-Identifier: MIT OR Apache-2.0
//! The browser: a scene ticked on its own simulation thread.
//!
//! This module handles:
//! - Moving a scene onto a simulation thread and pacing its ticks
//! - Pausing, single-stepping and resuming the loop
//! - Letting external callers wait for frame boundaries
//! - Shutting down after the in-flight tick completes

use crate::config::{BrowserConfig, ConfigError};
use crate::sai::SaiNode;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use x3d_renderers::GlContext;
use x3d_scene::{FactoryError, NodeId, Scene, SceneError, SceneHandle, TickReport};

/// Run state of the simulation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Ticking at the configured frame rate
    #[default]
    Running,
    /// Waiting; `step` runs single ticks
    Paused,
    /// The loop has exited
    Stopped,
}

impl RunState {
    /// Check if ticks are being produced
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running)
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        matches!(self, RunState::Paused)
    }

    /// Check if the loop has exited
    pub fn is_stopped(&self) -> bool {
        matches!(self, RunState::Stopped)
    }
}

/// Totals accumulated by the simulation loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowserStats {
    /// Completed ticks
    pub ticks: u64,
    /// External writes applied
    pub writes_applied: u64,
    /// External writes dropped at drain time
    pub writes_dropped: u64,
    /// Events accepted by the scene's queue over its lifetime
    pub events_enqueued: u64,
    /// Events carried along routes
    pub events_propagated: u64,
    /// Listener calls
    pub notifications: u64,
    /// Routes truncated by the visit cap
    pub truncations: u64,
    /// Render uploads drained after ticks
    pub uploads: u64,
    /// Wall-clock time the loop ran
    pub elapsed: Duration,
}

impl BrowserStats {
    fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.writes_applied += report.writes_applied as u64;
        self.writes_dropped += report.writes_dropped as u64;
        self.events_propagated += report.events_propagated as u64;
        self.notifications += report.notifications as u64;
        self.truncations += report.truncations.len() as u64;
    }
}

#[derive(Debug)]
struct ControlState {
    run: RunState,
    steps: u64,
    ticks: u64,
}

/// Shared between the browser and its simulation thread
#[derive(Debug)]
struct LoopControl {
    state: Mutex<ControlState>,
    /// Signalled on pause/resume/step/stop
    changed: Condvar,
    /// Signalled after every tick and when the loop exits
    ticked: Condvar,
    stop: AtomicBool,
}

impl LoopControl {
    fn new() -> Self {
        Self {
            state: Mutex::new(ControlState {
                run: RunState::Running,
                steps: 0,
                ticks: 0,
            }),
            changed: Condvar::new(),
            ticked: Condvar::new(),
            stop: AtomicBool::new(false),
        }
    }

    fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        let _state = self.state.lock();
        self.changed.notify_all();
    }

    /// Block until the loop may run a tick. Returns `false` on stop.
    fn wait_for_permission(&self) -> bool {
        let mut state = self.state.lock();
        loop {
            if self.is_stopping() {
                return false;
            }
            match state.run {
                RunState::Running => return true,
                RunState::Paused if state.steps > 0 => {
                    state.steps -= 1;
                    return true;
                }
                _ => self.changed.wait(&mut state),
            }
        }
    }

    /// Sleep until `deadline` unless stopped, paused or stepped first
    fn wait_until(&self, deadline: Instant) {
        let mut state = self.state.lock();
        while !self.is_stopping() && state.run.is_running() {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
    }

    fn publish_tick(&self, tick: u64) {
        self.state.lock().ticks = tick;
        self.ticked.notify_all();
    }

    fn finish(&self) {
        self.state.lock().run = RunState::Stopped;
        self.ticked.notify_all();
    }
}

/// What the simulation thread hands back when it exits
struct LoopOutcome {
    scene: Scene,
    stats: BrowserStats,
    error: Option<SceneError>,
}

/// An X3D browser instance.
///
/// Owns the simulation thread; external callers talk to the scene through
/// [`Browser::handle`] or the typed [`SaiNode`] handles.
pub struct Browser {
    handle: SceneHandle,
    config: BrowserConfig,
    gl: Option<GlContext>,
    control: Arc<LoopControl>,
    thread: Option<JoinHandle<LoopOutcome>>,
}

impl Browser {
    /// Build a scene for `config` and start ticking it.
    ///
    /// The scene gets every renderer package; OpenGL uploads are drained
    /// after each tick. Like every constructor, this installs a global
    /// `tracing` subscriber with `config.log_filter` unless one is already
    /// set.
    pub fn launch(config: BrowserConfig) -> Result<Self, BrowserError> {
        config.validate()?;
        let gl = GlContext::new();
        let factory = x3d_renderers::default_factory(&gl)?;
        let scene = Scene::with_config(factory, config.renderer, config.cascade);
        Self::spawn(scene, config, Some(gl))
    }

    /// Start ticking an existing scene.
    ///
    /// The scene's cascade settings are replaced by `config.cascade`.
    pub fn start(scene: Scene, config: BrowserConfig) -> Result<Self, BrowserError> {
        config.validate()?;
        Self::spawn(scene, config, None)
    }

    /// Start ticking an existing scene whose OpenGL nodes write into `gl`
    pub fn start_rendering(
        scene: Scene,
        config: BrowserConfig,
        gl: GlContext,
    ) -> Result<Self, BrowserError> {
        config.validate()?;
        Self::spawn(scene, config, Some(gl))
    }

    fn spawn(
        mut scene: Scene,
        config: BrowserConfig,
        gl: Option<GlContext>,
    ) -> Result<Self, BrowserError> {
        if scene.renderer() != config.renderer {
            tracing::warn!(
                "Scene is bound to {} but the config selects {}",
                scene.renderer(),
                config.renderer
            );
        }
        crate::logging::init_tracing(&config.log_filter);
        scene.apply_config(config.cascade);

        let handle = scene.handle();
        let control = Arc::new(LoopControl::new());
        let thread = {
            let control = Arc::clone(&control);
            let gl = gl.clone();
            let period = config.frame_period();
            std::thread::Builder::new()
                .name("x3d-simulation".into())
                .spawn(move || run_loop(scene, &control, gl.as_ref(), period))?
        };

        tracing::info!(
            "Browser started ({} renderer, {})",
            config.renderer,
            match config.frame_period() {
                Some(_) => format!("{} fps", config.frame_rate),
                None => "free-running".to_string(),
            }
        );
        Ok(Self {
            handle,
            config,
            gl,
            control,
            thread: Some(thread),
        })
    }

    /// Handle to the running scene
    pub fn handle(&self) -> SceneHandle {
        self.handle.clone()
    }

    /// Configuration the browser was started with
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Render context drained by the loop, if any
    pub fn gl_context(&self) -> Option<&GlContext> {
        self.gl.as_ref()
    }

    /// Current run state
    pub fn run_state(&self) -> RunState {
        self.control.state.lock().run
    }

    /// Completed ticks
    pub fn tick_count(&self) -> u64 {
        self.control.state.lock().ticks
    }

    /// Pause after the in-flight tick. Returns `false` if not running.
    pub fn pause(&self) -> bool {
        let mut state = self.control.state.lock();
        if state.run != RunState::Running {
            return false;
        }
        state.run = RunState::Paused;
        self.control.changed.notify_all();
        tracing::info!("Browser paused at tick {}", state.ticks);
        true
    }

    /// Resume ticking. Returns `false` if not paused.
    pub fn resume(&self) -> bool {
        let mut state = self.control.state.lock();
        if state.run != RunState::Paused {
            return false;
        }
        state.run = RunState::Running;
        state.steps = 0;
        self.control.changed.notify_all();
        tracing::info!("Browser resumed");
        true
    }

    /// Run one tick while paused. Returns `false` if not paused.
    pub fn step(&self) -> bool {
        let mut state = self.control.state.lock();
        if state.run != RunState::Paused {
            return false;
        }
        state.steps += 1;
        self.control.changed.notify_all();
        true
    }

    /// Block until at least `tick` ticks have completed. Returns `false` on
    /// timeout or if the loop exited first.
    pub fn wait_for_tick(&self, tick: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.control.state.lock();
        while state.ticks < tick && state.run != RunState::Stopped {
            if self.control.ticked.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.ticks >= tick
    }

    /// Wait until every event queued so far has been drained and propagated
    pub fn sync(&self, timeout: Duration) -> bool {
        let target = self.tick_count() + 2;
        if self.run_state().is_paused() {
            self.step();
            self.step();
        }
        self.wait_for_tick(target, timeout)
    }

    /// Create a node of a registered type and add it to the scene
    pub fn create_node(&self, type_name: &str) -> Result<SaiNode, BrowserError> {
        let node = self.handle.create_node(type_name)?;
        let id = self.handle.add_node(node);
        Ok(SaiNode::new(self.handle.clone(), id)?)
    }

    /// Typed handle to an existing node
    pub fn node(&self, id: NodeId) -> Result<SaiNode, BrowserError> {
        Ok(SaiNode::new(self.handle.clone(), id)?)
    }

    /// Stop after the in-flight tick and return the loop's totals.
    ///
    /// A fatal scene error that ended the loop early is returned instead.
    pub fn stop(self) -> Result<BrowserStats, BrowserError> {
        self.shutdown().map(|(_, stats)| stats)
    }

    /// Stop and take the scene back
    pub fn shutdown(mut self) -> Result<(Scene, BrowserStats), BrowserError> {
        let outcome = self.join()?;
        tracing::info!("Browser stopped after {} ticks", outcome.stats.ticks);
        match outcome.error {
            Some(err) => Err(BrowserError::Scene(err)),
            None => Ok((outcome.scene, outcome.stats)),
        }
    }

    fn join(&mut self) -> Result<LoopOutcome, BrowserError> {
        self.control.request_stop();
        let thread = self.thread.take().ok_or(BrowserError::AlreadyStopped)?;
        thread.join().map_err(|_| BrowserError::SimulationPanicked)
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        if self.thread.is_some() {
            if let Err(err) = self.join() {
                tracing::error!("Browser shutdown failed: {}", err);
            }
        }
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("renderer", &self.config.renderer)
            .field("state", &self.run_state())
            .field("ticks", &self.tick_count())
            .finish_non_exhaustive()
    }
}

fn run_loop(
    mut scene: Scene,
    control: &LoopControl,
    gl: Option<&GlContext>,
    period: Option<Duration>,
) -> LoopOutcome {
    let started = Instant::now();
    let mut stats = BrowserStats::default();
    let mut error = None;
    let mut next_frame = started;

    while control.wait_for_permission() {
        let time = started.elapsed().as_secs_f64();
        match scene.tick(time) {
            Ok(report) => {
                stats.record(&report);
                if let Some(gl) = gl {
                    stats.uploads += gl.take_uploads().len() as u64;
                }
                control.publish_tick(report.tick);
            }
            Err(err) => {
                tracing::error!("Simulation stopped: {}", err);
                error = Some(err);
                break;
            }
        }

        if let Some(period) = period {
            next_frame += period;
            let now = Instant::now();
            if next_frame <= now {
                next_frame = now;
            } else {
                control.wait_until(next_frame);
            }
        }
    }

    stats.elapsed = started.elapsed();
    stats.events_enqueued = scene.handle().total_enqueued();
    control.finish();
    LoopOutcome { scene, stats, error }
}

/// Errors raised by the browser
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// Scene operation failed, or a fatal error ended the loop
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Factory setup failed
    #[error("Factory error: {0}")]
    Factory(#[from] FactoryError),

    /// Configuration rejected
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The simulation thread could not be spawned
    #[error("Failed to spawn simulation thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The simulation thread panicked
    #[error("Simulation thread panicked")]
    SimulationPanicked,

    /// The loop was already shut down
    #[error("Browser already stopped")]
    AlreadyStopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOG_FILTER;
    use std::sync::Barrier;
    use x3d_renderers::{default_factory, GlResource};
    use x3d_scene::nodes::{POINT_LIGHT, SCALAR_INTERPOLATOR, TRANSFORM};
    use x3d_scene::{CascadeConfig, FieldError, FieldEvent, FieldValue, Renderer};

    const WAIT: Duration = Duration::from_secs(5);

    fn scene(renderer: Renderer) -> Scene {
        Scene::new(default_factory(&GlContext::new()).unwrap(), renderer)
    }

    fn free_running() -> BrowserConfig {
        BrowserConfig::default().with_frame_rate(0.0)
    }

    #[test]
    fn test_transform_drives_point_light() {
        for renderer in [Renderer::NoRender, Renderer::OpenGl] {
            let mut scene = scene(renderer);
            let handle = scene.handle();
            let t = scene.add_node(scene.create_node(TRANSFORM).unwrap());
            let u = scene.add_node(scene.create_node(POINT_LIGHT).unwrap());
            scene.add_route_named(t, "translation", u, "center").unwrap();

            handle
                .write_named(t, "translation", FieldValue::SFVec3f([1.0, 0.0, 0.0]))
                .unwrap();
            scene.tick(0.0).unwrap();

            assert_eq!(
                handle.read_named(t, "translation").unwrap(),
                FieldValue::SFVec3f([1.0, 0.0, 0.0])
            );
            assert_eq!(
                handle.read_named(u, "center").unwrap(),
                FieldValue::SFVec3f([1.0, 0.0, 0.0])
            );
        }
    }

    #[test]
    fn test_two_node_cycle_is_truncated() {
        let mut scene = scene(Renderer::NoRender);
        let handle = scene.handle();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let mut node = scene.create_node(SCALAR_INTERPOLATOR).unwrap();
            node.set_initial("key", FieldValue::MFFloat(vec![0.0, 1.0])).unwrap();
            node.set_initial("keyValue", FieldValue::MFFloat(vec![0.5, 1.0])).unwrap();
            ids.push(scene.add_node(node));
        }
        let (a, b) = (ids[0], ids[1]);
        scene.add_route_named(a, "value_changed", b, "set_fraction").unwrap();
        scene.add_route_named(b, "value_changed", a, "set_fraction").unwrap();

        handle.write_named(a, "set_fraction", FieldValue::SFFloat(0.0)).unwrap();
        let report = scene.tick(0.0).unwrap();

        assert_eq!(report.truncations.len(), 1);
        assert_eq!(handle.read_named(b, "value_changed").unwrap(), FieldValue::SFFloat(0.75));
        assert_eq!(handle.read_named(a, "value_changed").unwrap(), FieldValue::SFFloat(0.875));
    }

    #[test]
    fn test_output_only_write_denied() {
        let mut scene = scene(Renderer::NoRender);
        let handle = scene.handle();
        let id = scene.add_node(scene.create_node(SCALAR_INTERPOLATOR).unwrap());
        let before = handle.read_named(id, "value_changed").unwrap();

        let err = handle
            .write_named(id, "value_changed", FieldValue::SFFloat(9.0))
            .unwrap_err();
        assert!(matches!(err, SceneError::Field(FieldError::AccessDenied { .. })));

        scene.tick(0.0).unwrap();
        assert_eq!(handle.read_named(id, "value_changed").unwrap(), before);
    }

    #[test]
    fn test_listener_order_and_deferred_writes() {
        let mut scene = scene(Renderer::NoRender);
        let handle = scene.handle();
        let t = scene.add_node(scene.create_node(TRANSFORM).unwrap());
        let u = scene.add_node(scene.create_node(POINT_LIGHT).unwrap());
        let translation = handle.field_ref(t, "translation").unwrap();
        let center = handle.field_ref(u, "center").unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&calls);
        let writer = handle.clone();
        handle
            .add_listener(translation, move |event: &FieldEvent| {
                first.lock().push("first");
                writer.write(center, event.value.clone()).unwrap();
            })
            .unwrap();
        let second = Arc::clone(&calls);
        handle
            .add_listener(translation, move |_: &FieldEvent| second.lock().push("second"))
            .unwrap();

        handle.write(translation, FieldValue::SFVec3f([0.0, 2.0, 0.0])).unwrap();
        scene.tick(0.0).unwrap();
        assert_eq!(*calls.lock(), vec!["first", "second"]);
        assert_eq!(handle.read(center).unwrap(), FieldValue::SFVec3f([0.0; 3]));

        scene.tick(0.0).unwrap();
        assert_eq!(handle.read(center).unwrap(), FieldValue::SFVec3f([0.0, 2.0, 0.0]));
    }

    #[test]
    fn test_concurrent_writers() {
        let mut scene = scene(Renderer::NoRender);
        let handle = scene.handle();
        let t = scene.add_node(scene.create_node(TRANSFORM).unwrap());
        let field = handle.field_ref(t, "translation").unwrap();

        let notifications = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&notifications);
        handle
            .add_listener(field, move |event: &FieldEvent| sink.lock().push(event.value.clone()))
            .unwrap();
        scene.tick(0.0).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let writers: Vec<_> = [1.0, 2.0]
            .into_iter()
            .map(|x| {
                let handle = handle.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    handle.write(field, FieldValue::SFVec3f([x, 0.0, 0.0])).unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        scene.tick(0.0).unwrap();

        let value = handle.read(field).unwrap();
        assert!(
            value == FieldValue::SFVec3f([1.0, 0.0, 0.0])
                || value == FieldValue::SFVec3f([2.0, 0.0, 0.0]),
            "unexpected value {value:?}"
        );
        assert_eq!(*notifications.lock(), vec![value]);
    }

    #[test]
    fn test_running_browser_applies_writes() {
        let browser = Browser::launch(free_running().with_renderer(Renderer::OpenGl)).unwrap();
        let handle = browser.handle();
        let t = browser.create_node(TRANSFORM).unwrap();
        let u = browser.create_node(POINT_LIGHT).unwrap();

        t.add_route("translation", &u, "center").unwrap();
        handle
            .write_named(t.id(), "translation", FieldValue::SFVec3f([1.0, 0.0, 0.0]))
            .unwrap();
        assert!(browser.sync(WAIT));

        assert_eq!(
            handle.read_named(u.id(), "center").unwrap(),
            FieldValue::SFVec3f([1.0, 0.0, 0.0])
        );
        let Some(GlResource::Light(light)) = browser.gl_context().unwrap().resource(u.id()) else {
            panic!("expected light state");
        };
        assert_eq!(light.position, [1.0, 0.0, 0.0, 1.0]);

        let stats = browser.stop().unwrap();
        assert!(stats.ticks >= 2);
        assert!(stats.uploads >= 2);
        assert_eq!(stats.events_propagated, 1);
    }

    #[test]
    fn test_pause_step_resume() {
        let browser = Browser::start(scene(Renderer::NoRender), free_running()).unwrap();
        assert!(browser.wait_for_tick(1, WAIT));

        assert!(browser.pause());
        assert!(!browser.pause());
        assert_eq!(browser.run_state(), RunState::Paused);

        // The in-flight tick may still land; after that the count is frozen.
        std::thread::sleep(Duration::from_millis(20));
        let frozen = browser.tick_count();
        assert!(!browser.wait_for_tick(frozen + 1, Duration::from_millis(50)));

        assert!(browser.step());
        assert!(browser.wait_for_tick(frozen + 1, WAIT));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(browser.tick_count(), frozen + 1);

        assert!(browser.resume());
        assert!(!browser.step());
        assert!(browser.wait_for_tick(frozen + 10, WAIT));
        browser.stop().unwrap();
    }

    #[test]
    fn test_frame_rate_paces_ticks() {
        let browser = Browser::start(
            scene(Renderer::NoRender),
            BrowserConfig::default().with_frame_rate(20.0),
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(200));
        let stats = browser.stop().unwrap();
        assert!(stats.ticks >= 1 && stats.ticks <= 8, "ticked {} times", stats.ticks);
    }

    #[test]
    fn test_overflow_stops_loop() {
        let config =
            free_running().with_cascade(CascadeConfig::default().with_max_pending_events(4));
        let browser = Browser::launch(config).unwrap();
        let handle = browser.handle();
        let t = browser.create_node(TRANSFORM).unwrap();

        let mut batch = handle.begin_update();
        for i in 0..5 {
            batch
                .write_named(t.id(), "translation", FieldValue::SFVec3f([i as f32, 0.0, 0.0]))
                .unwrap();
        }
        assert!(batch.commit().unwrap_err().is_fatal());

        let deadline = Instant::now() + WAIT;
        while !browser.run_state().is_stopped() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(browser.run_state().is_stopped());
        assert!(matches!(
            browser.stop(),
            Err(BrowserError::Scene(SceneError::QueueOverflow { capacity: 4 }))
        ));
    }

    #[test]
    fn test_start_applies_configured_queue_bound() {
        let config = free_running().with_cascade(
            CascadeConfig::default()
                .with_max_route_visits(2)
                .with_max_pending_events(4),
        );
        let browser = Browser::start(scene(Renderer::NoRender), config).unwrap();
        let handle = browser.handle();
        assert_eq!(handle.queue_capacity(), 4);

        let t = browser.create_node(TRANSFORM).unwrap();
        let mut batch = handle.begin_update();
        for i in 0..5 {
            batch
                .write_named(t.id(), "translation", FieldValue::SFVec3f([i as f32, 0.0, 0.0]))
                .unwrap();
        }
        assert!(matches!(batch.commit(), Err(SceneError::QueueOverflow { capacity: 4 })));
        assert!(matches!(
            browser.shutdown(),
            Err(BrowserError::Scene(SceneError::QueueOverflow { capacity: 4 }))
        ));
    }

    #[test]
    fn test_launch_installs_log_filter() {
        let browser = Browser::launch(free_running()).unwrap();
        assert!(matches!(
            crate::logging::try_init_tracing(DEFAULT_LOG_FILTER),
            Err(crate::logging::LoggingError::AlreadyInitialized(_))
        ));
        browser.stop().unwrap();
    }

    #[test]
    fn test_invalid_log_filter_rejected() {
        let config = BrowserConfig {
            log_filter: "x3d_scene=loud".into(),
            ..free_running()
        };
        let err = Browser::launch(config).unwrap_err();
        assert!(matches!(err, BrowserError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_shutdown_returns_scene() {
        let browser = Browser::launch(free_running()).unwrap();
        let t = browser.create_node(TRANSFORM).unwrap();
        let u = browser.create_node(POINT_LIGHT).unwrap();
        t.add_route("translation", &u, "center").unwrap();
        assert!(browser.sync(WAIT));

        let (scene, stats) = browser.shutdown().unwrap();
        assert_eq!(scene.routes().len(), 1);
        assert_eq!(stats.events_enqueued, 1);
        assert_eq!(scene.tick_count(), stats.ticks);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Browser::launch(BrowserConfig::default().with_frame_rate(f64::NAN)).unwrap_err();
        assert!(matches!(err, BrowserError::Config(ConfigError::Invalid(_))));
    }
}
