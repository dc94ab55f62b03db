//! Frame scheduling.
//!
//! [`FrameScheduler`] runs update and render phases in sequence on the
//! calling thread. [`FrameScheduler::split`] turns it into an
//! [`UpdateDriver`] and a [`RenderDriver`] for two threads plus a cloneable
//! [`SchedulerHandle`] for everyone else.
//!
//! ## Threaded protocol
//!
//! ```text
//! update thread                      render thread
//! ─────────────                      ─────────────
//! wait(update)   ◄─────────────┐     wait(render) ◄──┐
//! [single step: wait(step)]    │                     │
//! game, propagate, sweep, sync │     draw(proxies)   │
//! signal(render) ──────────────┼──►  sweep orphans   │
//!                              └───  signal(update)  │
//!                                    signal(frame_done)
//! ```
//!
//! The update gate starts signalled, so frame 1 begins at once. Update `k`
//! always completes before render `k` starts, and render `k` before update
//! `k + 1`. Every wait is followed by a closing check; shutdown sets the flag
//! and signals every gate, so each blocked thread wakes at most once more and
//! returns [`FrameStatus::Closing`].

use std::sync::Arc;

use engine_render::ProxySink;
use engine_scene::{SceneError, World};
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::context::FrameContext;
use crate::error::SchedulerError;
use crate::gate::FrameGates;
use crate::pipeline::UpdatePipeline;
use crate::stats::{FrameStats, StatsRecorder};

/// Result of driving one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The phase ran.
    Completed,
    /// The scheduler is closing; the phase did no work.
    Closing,
}

impl FrameStatus {
    /// Returns `true` for [`FrameStatus::Closing`].
    #[must_use]
    pub fn is_closing(self) -> bool {
        matches!(self, Self::Closing)
    }
}

/// Runs the update phase and records the outcome. Any error closes the
/// scheduler before it is returned.
fn run_update<S, G>(
    pipeline: &mut UpdatePipeline,
    dt: f32,
    sink: &S,
    gates: &FrameGates,
    stats: &StatsRecorder,
    game: G,
) -> Result<FrameStatus, SchedulerError>
where
    S: ProxySink,
    G: FnOnce(&mut FrameContext<'_>) -> Result<(), SceneError>,
{
    match pipeline.run(dt, sink, game) {
        Ok(outcome) => {
            stats.record_update(&outcome.sync, &outcome.garbage);
            if outcome.exit_requested {
                info!(frame = outcome.frame, "exit requested by game");
                gates.shutdown();
            }
            Ok(FrameStatus::Completed)
        }
        Err(err) => {
            if err.is_invariant_violation() {
                error!(frame = pipeline.frame(), error = %err, "lifecycle invariant violated, shutting down");
            } else {
                error!(frame = pipeline.frame(), error = %err, "update phase failed, shutting down");
            }
            gates.shutdown();
            Err(err)
        }
    }
}

/// Runs the draw callback, then sweeps orphaned proxies.
fn run_render<S, D>(frame: u64, sink: &S, stats: &StatsRecorder, draw: D)
where
    S: ProxySink,
    D: FnOnce(u64, &S),
{
    draw(frame, sink);
    let swept = sink.sweep_orphaned();
    stats.record_render(swept);
    debug!(frame, swept, "render complete");
}

/// Single-threaded scheduler.
#[derive(Debug)]
pub struct FrameScheduler<S: ProxySink> {
    config: SchedulerConfig,
    pipeline: UpdatePipeline,
    sink: Arc<S>,
    gates: FrameGates,
    stats: Arc<StatsRecorder>,
    rendered: u64,
}

impl<S: ProxySink> FrameScheduler<S> {
    /// Create a scheduler that owns `world` and syncs into `sink`.
    #[must_use]
    pub fn new(config: SchedulerConfig, world: World, sink: Arc<S>) -> Self {
        info!(
            threading = ?config.threading,
            single_step = config.single_step,
            fixed_delta = config.fixed_delta,
            "frame scheduler created"
        );
        let pipeline = UpdatePipeline::new(world, config.frame_budget());
        Self {
            config,
            pipeline,
            sink,
            gates: FrameGates::new(),
            stats: Arc::new(StatsRecorder::default()),
            rendered: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the scene.
    #[must_use]
    pub fn world(&self) -> &World {
        self.pipeline.world()
    }

    /// Returns the scene for setup between frames.
    pub fn world_mut(&mut self) -> &mut World {
        self.pipeline.world_mut()
    }

    /// Returns the proxy sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Returns a handle for shutdown and statistics.
    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            gates: self.gates.clone(),
            stats: Arc::clone(&self.stats),
            single_step: self.config.single_step,
        }
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats.snapshot()
    }

    /// Run one update phase with measured delta time.
    ///
    /// # Errors
    ///
    /// Any update-phase error. The scheduler is closed before it returns.
    pub fn on_update<G>(&mut self, game: G) -> Result<FrameStatus, SchedulerError>
    where
        G: FnOnce(&mut FrameContext<'_>) -> Result<(), SceneError>,
    {
        if self.gates.is_closing() {
            return Ok(FrameStatus::Closing);
        }
        let dt = self.pipeline.next_delta(None, self.config.fixed_delta);
        run_update(&mut self.pipeline, dt, &*self.sink, &self.gates, &self.stats, game)
    }

    /// Run one render phase.
    pub fn on_render<D>(&mut self, draw: D) -> FrameStatus
    where
        D: FnOnce(u64, &S),
    {
        if self.gates.is_closing() {
            return FrameStatus::Closing;
        }
        self.rendered += 1;
        run_render(self.rendered, &*self.sink, &self.stats, draw);
        FrameStatus::Completed
    }

    /// Update with the fixed delta time, then render, before returning.
    ///
    /// # Errors
    ///
    /// Any update-phase error. The scheduler is closed before it returns.
    pub fn render_single_frame_sync<G, D>(&mut self, game: G, draw: D) -> Result<FrameStatus, SchedulerError>
    where
        G: FnOnce(&mut FrameContext<'_>) -> Result<(), SceneError>,
        D: FnOnce(u64, &S),
    {
        if self.gates.is_closing() {
            return Ok(FrameStatus::Closing);
        }
        let dt = self
            .pipeline
            .next_delta(Some(self.config.fixed_delta), self.config.fixed_delta);
        run_update(&mut self.pipeline, dt, &*self.sink, &self.gates, &self.stats, game)?;
        Ok(self.on_render(draw))
    }

    /// Split into per-thread drivers.
    #[must_use]
    pub fn split(self) -> (UpdateDriver<S>, RenderDriver<S>, SchedulerHandle) {
        let handle = self.handle();
        // Frame 1 needs no preceding render.
        self.gates.update().signal();
        info!(single_step = self.config.single_step, "frame scheduler split into update and render drivers");

        let update = UpdateDriver {
            pipeline: self.pipeline,
            sink: Arc::clone(&self.sink),
            gates: self.gates.clone(),
            stats: Arc::clone(&self.stats),
            single_step: self.config.single_step,
            fixed_delta: self.config.fixed_delta,
        };
        let render = RenderDriver {
            sink: self.sink,
            gates: self.gates,
            stats: self.stats,
            frame: self.rendered,
        };
        (update, render, handle)
    }
}

/// Runs update phases on the update thread.
#[derive(Debug)]
pub struct UpdateDriver<S: ProxySink> {
    pipeline: UpdatePipeline,
    sink: Arc<S>,
    gates: FrameGates,
    stats: Arc<StatsRecorder>,
    single_step: bool,
    fixed_delta: f32,
}

impl<S: ProxySink> UpdateDriver<S> {
    /// Wait for the previous frame to render (and, in single-step mode, for
    /// a step request), then run one update phase and release the render
    /// thread.
    ///
    /// # Errors
    ///
    /// Any update-phase error. The scheduler is closed before it returns.
    pub fn on_update<G>(&mut self, game: G) -> Result<FrameStatus, SchedulerError>
    where
        G: FnOnce(&mut FrameContext<'_>) -> Result<(), SceneError>,
    {
        if !self.gates.pass(self.gates.update()) {
            return Ok(FrameStatus::Closing);
        }
        if self.single_step && !self.gates.pass(self.gates.step()) {
            return Ok(FrameStatus::Closing);
        }

        let fixed = self.single_step.then_some(self.fixed_delta);
        let dt = self.pipeline.next_delta(fixed, self.fixed_delta);
        let status = run_update(&mut self.pipeline, dt, &*self.sink, &self.gates, &self.stats, game)?;
        self.gates.render().signal();
        Ok(status)
    }

    /// Returns the scene.
    #[must_use]
    pub fn world(&self) -> &World {
        self.pipeline.world()
    }

    /// Returns the number of the last frame updated.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.pipeline.frame()
    }
}

/// Runs render phases on the render thread.
#[derive(Debug)]
pub struct RenderDriver<S: ProxySink> {
    sink: Arc<S>,
    gates: FrameGates,
    stats: Arc<StatsRecorder>,
    frame: u64,
}

impl<S: ProxySink> RenderDriver<S> {
    /// Wait for the update phase of the next frame, draw, sweep orphaned
    /// proxies, then release the update thread and any single-step caller.
    pub fn on_render<D>(&mut self, draw: D) -> FrameStatus
    where
        D: FnOnce(u64, &S),
    {
        if !self.gates.pass(self.gates.render()) {
            return FrameStatus::Closing;
        }
        self.frame += 1;
        run_render(self.frame, &*self.sink, &self.stats, draw);
        self.gates.update().signal();
        self.gates.frame_done().signal();
        FrameStatus::Completed
    }

    /// Returns the number of the last frame rendered.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Cloneable control surface of a scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    gates: FrameGates,
    stats: Arc<StatsRecorder>,
    single_step: bool,
}

impl SchedulerHandle {
    /// Block until one more frame has been updated and rendered by the
    /// driver threads.
    ///
    /// In single-step mode this releases exactly one frame; otherwise it
    /// waits for the next frame to finish. Concurrent callers on cloned
    /// handles are served one after another, one frame each.
    pub fn render_single_frame_sync(&self) -> FrameStatus {
        let _stepper = self.gates.lock_stepper();
        if self.gates.is_closing() {
            return FrameStatus::Closing;
        }
        self.gates.frame_done().clear();
        if self.single_step {
            self.gates.step().signal();
        }
        if self.gates.pass(self.gates.frame_done()) {
            FrameStatus::Completed
        } else {
            FrameStatus::Closing
        }
    }

    /// Close the scheduler and wake every blocked thread. Idempotent and
    /// callable from any thread.
    pub fn shutdown(&self) {
        self.gates.shutdown();
    }

    /// Returns `true` once shutdown has been requested.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.gates.is_closing()
    }

    /// Returns a snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> FrameStats {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    use crossbeam_channel::{Receiver, unbounded};
    use engine_math::{Aabb, Mat4, Quat, Transform, Vec3};
    use engine_object::{LifecycleError, ObjectId};
    use engine_render::RenderScene;
    use engine_scene::{ComponentId, GeometryRef, MeshRenderer, ProxyId};

    use super::*;
    use crate::config::ThreadingMode;

    const WATCHDOG: Duration = Duration::from_secs(5);

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Update(u64),
        Render(u64),
    }

    /// One actor with a spinning mesh.
    fn make_world() -> (World, ComponentId) {
        let mut world = World::new();
        let actor = world.spawn_actor("spinner").unwrap();
        let mesh = world.create_mesh_component(
            "mesh",
            Transform::IDENTITY,
            MeshRenderer::new(GeometryRef::new("cube")),
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE),
        );
        world.attach_component(actor, mesh).unwrap();
        (world, mesh)
    }

    fn spin(ctx: &mut FrameContext<'_>, mesh: ComponentId) -> Result<(), SceneError> {
        let angle = ctx.frame as f32 * 0.1;
        ctx.world.set_relative_rotation(mesh, Quat::from_rotation_y(angle))
    }

    type Threaded = (
        UpdateDriver<RenderScene>,
        RenderDriver<RenderScene>,
        SchedulerHandle,
        ComponentId,
        Arc<RenderScene>,
    );

    fn make_threaded_with_scene(config: SchedulerConfig) -> Threaded {
        let (world, mesh) = make_world();
        let scene = Arc::new(RenderScene::new());
        let config = config.with_threading(ThreadingMode::Multi);
        let (update, render, handle) =
            FrameScheduler::new(config, world, Arc::clone(&scene)).split();
        (update, render, handle, mesh, scene)
    }

    fn make_threaded(
        config: SchedulerConfig,
    ) -> (UpdateDriver<RenderScene>, RenderDriver<RenderScene>, SchedulerHandle, ComponentId) {
        let (update, render, handle, mesh, _) = make_threaded_with_scene(config);
        (update, render, handle, mesh)
    }

    /// Spawn both driver threads. Each sends its name on the returned
    /// channel when its loop ends.
    fn spawn_drivers(
        mut update: UpdateDriver<RenderScene>,
        mut render: RenderDriver<RenderScene>,
        mesh: ComponentId,
        log: Arc<Mutex<Vec<Phase>>>,
        update_stall: Duration,
        render_stall: Duration,
    ) -> Receiver<&'static str> {
        let (done_tx, done_rx) = unbounded();

        let update_log = Arc::clone(&log);
        let update_done = done_tx.clone();
        thread::spawn(move || {
            loop {
                let status = update.on_update(|ctx| {
                    update_log.lock().unwrap().push(Phase::Update(ctx.frame));
                    thread::sleep(update_stall);
                    spin(ctx, mesh)
                });
                if !matches!(status, Ok(FrameStatus::Completed)) {
                    break;
                }
            }
            let _ = update_done.send("update");
        });

        thread::spawn(move || {
            while render.on_render(|frame, scene: &RenderScene| {
                assert_eq!(scene.drawable().len(), 1);
                log.lock().unwrap().push(Phase::Render(frame));
                thread::sleep(render_stall);
            }) == FrameStatus::Completed
            {}
            let _ = done_tx.send("render");
        });

        done_rx
    }

    fn join_drivers(done: &Receiver<&'static str>) {
        for _ in 0..2 {
            done.recv_timeout(WATCHDOG)
                .expect("driver thread did not terminate");
        }
    }

    fn wait_for_rendered(handle: &SchedulerHandle, frames: u64) {
        let deadline = Instant::now() + WATCHDOG;
        while handle.stats().frames_rendered < frames {
            assert!(Instant::now() < deadline, "frames did not advance");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn assert_alternating(log: &[Phase]) {
        for (i, phase) in log.iter().enumerate() {
            let frame = i as u64 / 2 + 1;
            let expected = if i % 2 == 0 {
                Phase::Update(frame)
            } else {
                Phase::Render(frame)
            };
            assert_eq!(*phase, expected, "out of order at {i}: {log:?}");
        }
    }

    #[test]
    fn test_single_threaded_frame() {
        let (world, mesh) = make_world();
        let scene = Arc::new(RenderScene::new());
        let mut scheduler = FrameScheduler::new(SchedulerConfig::default(), world, Arc::clone(&scene));

        assert_eq!(scheduler.on_update(|ctx| spin(ctx, mesh)).unwrap(), FrameStatus::Completed);
        let mut drawn = 0;
        let status = scheduler.on_render(|frame, scene: &RenderScene| {
            assert_eq!(frame, 1);
            drawn = scene.drawable().len();
        });
        assert_eq!(status, FrameStatus::Completed);
        assert_eq!(drawn, 1);

        let stats = scheduler.stats();
        assert_eq!(stats.frames_updated, 1);
        assert_eq!(stats.frames_rendered, 1);
        assert_eq!(stats.proxies_created, 1);
        assert!(scene.contains(ProxyId::for_component(mesh)));
    }

    #[test]
    fn test_render_single_frame_sync_uses_fixed_delta() {
        let (world, _) = make_world();
        let config = SchedulerConfig::default().with_fixed_delta(0.25);
        let mut scheduler = FrameScheduler::new(config, world, Arc::new(RenderScene::new()));

        let mut deltas = Vec::new();
        for _ in 0..3 {
            let status = scheduler
                .render_single_frame_sync(
                    |ctx| {
                        deltas.push(ctx.dt);
                        Ok(())
                    },
                    |_, _| {},
                )
                .unwrap();
            assert_eq!(status, FrameStatus::Completed);
        }
        assert_eq!(deltas, vec![0.25, 0.25, 0.25]);
        assert_eq!(scheduler.stats().frames_rendered, 3);
    }

    #[test]
    fn test_detached_proxy_swept_after_render() {
        let (world, mesh) = make_world();
        let scene = Arc::new(RenderScene::new());
        let mut scheduler = FrameScheduler::new(SchedulerConfig::default(), world, Arc::clone(&scene));
        scheduler.render_single_frame_sync(|_| Ok(()), |_, _| {}).unwrap();

        let actor = scheduler.world().find_actor_by_name("spinner").unwrap();
        let proxy = ProxyId::for_component(mesh);
        scheduler
            .on_update(|ctx| ctx.world.detach_component(actor, mesh))
            .unwrap();
        assert!(scene.get(proxy).unwrap().is_orphaned());

        scheduler.on_render(|_, scene: &RenderScene| {
            // Still present while this frame draws.
            assert!(scene.contains(proxy));
        });
        assert!(!scene.contains(proxy));
        assert_eq!(scheduler.stats().proxies_swept, 1);
    }

    #[test]
    fn test_invariant_violation_closes_scheduler() {
        let (world, _) = make_world();
        let mut scheduler = FrameScheduler::new(SchedulerConfig::default(), world, Arc::new(RenderScene::new()));
        let handle = scheduler.handle();

        let err = scheduler
            .on_update(|_| {
                Err(SceneError::Lifecycle(LifecycleError::UseAfterDestroy(
                    ObjectId::from_raw(1),
                )))
            })
            .unwrap_err();
        assert!(err.is_invariant_violation());
        assert!(handle.is_closing());
        assert_eq!(scheduler.on_update(|_| Ok(())).unwrap(), FrameStatus::Closing);
        assert_eq!(scheduler.on_render(|_, _| {}), FrameStatus::Closing);
    }

    #[test]
    fn test_exit_request_closes_scheduler() {
        let (world, _) = make_world();
        let mut scheduler = FrameScheduler::new(SchedulerConfig::default(), world, Arc::new(RenderScene::new()));
        let status = scheduler
            .on_update(|ctx| {
                ctx.request_exit();
                Ok(())
            })
            .unwrap();
        assert_eq!(status, FrameStatus::Completed);
        assert!(scheduler.handle().is_closing());
    }

    #[test]
    fn test_single_step_runs_exactly_requested_frames() {
        let (update, render, handle, mesh, scene) =
            make_threaded_with_scene(SchedulerConfig::default().with_single_step(true));
        let log = Arc::new(Mutex::new(Vec::new()));
        let done = spawn_drivers(update, render, mesh, Arc::clone(&log), Duration::ZERO, Duration::ZERO);
        let proxy = ProxyId::for_component(mesh);

        for frame in 1..=5u64 {
            assert_eq!(handle.render_single_frame_sync(), FrameStatus::Completed);
            // The proxy carries the rotation set by this frame's update.
            let expected = Mat4::from_quat(Quat::from_rotation_y(frame as f32 * 0.1));
            let drawn = scene.get(proxy).unwrap().state().world_transform;
            assert!(drawn.abs_diff_eq(expected, 1e-5), "frame {frame}: {drawn:?}");
        }
        // Nothing runs without another request.
        thread::sleep(Duration::from_millis(20));
        let stats = handle.stats();
        assert_eq!(stats.frames_updated, 5);
        assert_eq!(stats.frames_rendered, 5);

        handle.shutdown();
        join_drivers(&done);
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 10);
        assert_alternating(&log);
        assert_eq!(handle.render_single_frame_sync(), FrameStatus::Closing);
    }

    #[test]
    fn test_concurrent_step_callers_each_get_a_frame() {
        let (update, render, handle, mesh) =
            make_threaded(SchedulerConfig::default().with_single_step(true));
        let log = Arc::new(Mutex::new(Vec::new()));
        let done = spawn_drivers(update, render, mesh, Arc::clone(&log), Duration::ZERO, Duration::ZERO);

        let (step_tx, step_rx) = unbounded();
        for _ in 0..2 {
            let handle = handle.clone();
            let step_tx = step_tx.clone();
            thread::spawn(move || {
                let _ = step_tx.send(handle.render_single_frame_sync());
            });
        }
        for _ in 0..2 {
            assert_eq!(step_rx.recv_timeout(WATCHDOG).unwrap(), FrameStatus::Completed);
        }
        assert_eq!(handle.stats().frames_rendered, 2);

        handle.shutdown();
        join_drivers(&done);
        assert_alternating(&log.lock().unwrap());
    }

    #[test]
    fn test_shutdown_releases_every_blocked_step_caller() {
        // Drivers never run, so both callers stay blocked until shutdown.
        let (_update, _render, handle, _) =
            make_threaded(SchedulerConfig::default().with_single_step(true));

        let (step_tx, step_rx) = unbounded();
        for _ in 0..2 {
            let handle = handle.clone();
            let step_tx = step_tx.clone();
            thread::spawn(move || {
                let _ = step_tx.send(handle.render_single_frame_sync());
            });
        }

        thread::sleep(Duration::from_millis(20));
        assert!(step_rx.is_empty());
        handle.shutdown();
        for _ in 0..2 {
            assert_eq!(step_rx.recv_timeout(WATCHDOG).unwrap(), FrameStatus::Closing);
        }
    }

    #[test]
    fn test_free_running_phases_alternate() {
        let (update, render, handle, mesh) = make_threaded(SchedulerConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let done = spawn_drivers(update, render, mesh, Arc::clone(&log), Duration::ZERO, Duration::ZERO);

        wait_for_rendered(&handle, 20);
        handle.shutdown();
        join_drivers(&done);
        assert_alternating(&log.lock().unwrap());
    }

    #[test]
    fn test_shutdown_during_update_stall() {
        let (update, render, handle, mesh) = make_threaded(SchedulerConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let done = spawn_drivers(update, render, mesh, log, Duration::from_millis(30), Duration::ZERO);

        thread::sleep(Duration::from_millis(45));
        handle.shutdown();
        join_drivers(&done);
    }

    #[test]
    fn test_shutdown_during_render_stall() {
        let (update, render, handle, mesh) = make_threaded(SchedulerConfig::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let done = spawn_drivers(update, render, mesh, log, Duration::ZERO, Duration::from_millis(30));

        thread::sleep(Duration::from_millis(45));
        handle.shutdown();
        join_drivers(&done);
    }

    #[test]
    fn test_shutdown_while_all_threads_blocked() {
        let (update, render, handle, mesh) =
            make_threaded(SchedulerConfig::default().with_single_step(true));
        let log = Arc::new(Mutex::new(Vec::new()));
        let done = spawn_drivers(update, render, mesh, Arc::clone(&log), Duration::ZERO, Duration::ZERO);

        // No step is requested: update blocks on the step gate and render
        // on the render gate.
        thread::sleep(Duration::from_millis(20));
        assert!(log.lock().unwrap().is_empty());

        handle.shutdown();
        join_drivers(&done);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(handle.stats().frames_updated, 0);
    }

    #[test]
    fn test_update_error_stops_render_thread() {
        let (world, _) = make_world();
        let config = SchedulerConfig::default().with_threading(ThreadingMode::Multi);
        let (mut update, mut render, handle) =
            FrameScheduler::new(config, world, Arc::new(RenderScene::new())).split();
        let (done_tx, done_rx) = unbounded();

        let update_done = done_tx.clone();
        thread::spawn(move || {
            let result = loop {
                match update.on_update(|ctx| {
                    if ctx.frame == 3 {
                        Err(SceneError::Lifecycle(LifecycleError::AlreadyDestroyed(
                            ObjectId::from_raw(7),
                        )))
                    } else {
                        Ok(())
                    }
                }) {
                    Ok(FrameStatus::Completed) => {}
                    other => break other,
                }
            };
            let _ = update_done.send(result.is_err());
        });
        thread::spawn(move || {
            while render.on_render(|_, _| {}) == FrameStatus::Completed {}
            let _ = done_tx.send(false);
        });

        let mut saw_error = false;
        for _ in 0..2 {
            saw_error |= done_rx.recv_timeout(WATCHDOG).unwrap();
        }
        assert!(saw_error);
        assert!(handle.is_closing());
        assert_eq!(handle.stats().frames_updated, 2);
    }
}
