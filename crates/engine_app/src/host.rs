//! Runs the demo scene under the configured thread layout.
//!
//! Single-threaded runs alternate update and render on the calling thread,
//! paced to `fixed_delta` like a fixed-timestep loop. Threaded runs spawn an
//! `update` and a `render` thread; the calling thread steps frames (single
//! step) or waits for the frame count, then shuts the scheduler down and
//! joins both threads.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, ensure};
use engine_frame::{
    FrameScheduler, FrameStats, FrameStatus, SchedulerConfig, SchedulerHandle, ThreadingMode,
};
use engine_render::RenderScene;
use engine_scene::World;
use tracing::{debug, info, warn};

use crate::demo::Orrery;

/// Closes the scheduler when dropped, including during a panic.
struct ShutdownOnDrop(SchedulerHandle);

impl Drop for ShutdownOnDrop {
    fn drop(&mut self) {
        self.0.shutdown();
    }
}

fn draw(frame: u64, scene: &RenderScene) {
    debug!(
        frame,
        drawable = scene.drawable().len(),
        proxies = scene.len(),
        "frame drawn"
    );
}

/// Sleep out the remainder of `period`.
fn pace(frame: u64, start: Instant, period: Duration) {
    let elapsed = start.elapsed();
    if elapsed < period {
        thread::sleep(period - elapsed);
    } else {
        warn!(
            frame,
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = period.as_millis() as u64,
            "frame exceeded its period"
        );
    }
}

/// Build the demo scene and run it until `max_frames` have been rendered,
/// the game exits, or an update fails.
///
/// # Errors
///
/// Returns an error if the configuration is unusable, the scene cannot be
/// built, an update phase fails, or a driver thread panics.
pub fn run(config: SchedulerConfig) -> Result<FrameStats> {
    ensure!(
        config.fixed_delta.is_finite() && config.fixed_delta > 0.0,
        "fixed_delta must be a positive number of seconds, got {}",
        config.fixed_delta
    );

    let mut world = World::new();
    let orrery = Orrery::build(&mut world).context("failed to build demo scene")?;
    info!(
        actors = world.actor_count(),
        components = world.component_count(),
        materials = world.material_count(),
        "demo scene built"
    );

    let scheduler = FrameScheduler::new(config, world, Arc::new(RenderScene::new()));
    match scheduler.config().threading {
        ThreadingMode::Single => run_single(scheduler, orrery),
        ThreadingMode::Multi => run_threaded(scheduler, orrery),
    }
}

fn run_single(mut scheduler: FrameScheduler<RenderScene>, mut orrery: Orrery) -> Result<FrameStats> {
    let max_frames = scheduler.config().max_frames;
    let period = Duration::from_secs_f32(scheduler.config().fixed_delta);
    info!(max_frames, "starting single-threaded run");

    let mut frames = 0u64;
    while max_frames == 0 || frames < max_frames {
        let start = Instant::now();
        if scheduler.on_update(|ctx| orrery.update(ctx))?.is_closing()
            || scheduler.on_render(draw).is_closing()
        {
            break;
        }
        frames += 1;
        pace(frames, start, period);
    }

    info!(frames, "single-threaded run complete");
    Ok(scheduler.stats())
}

fn run_threaded(scheduler: FrameScheduler<RenderScene>, mut orrery: Orrery) -> Result<FrameStats> {
    let max_frames = scheduler.config().max_frames;
    let single_step = scheduler.config().single_step;
    let period = Duration::from_secs_f32(scheduler.config().fixed_delta);
    let (mut update, mut render, handle) = scheduler.split();
    info!(max_frames, single_step, "starting threaded run");

    let update_guard = ShutdownOnDrop(handle.clone());
    let update_thread = thread::Builder::new()
        .name("update".into())
        .spawn(move || {
            let _guard = update_guard;
            loop {
                let start = Instant::now();
                if update.on_update(|ctx| orrery.update(ctx))?.is_closing() {
                    break;
                }
                if !single_step {
                    pace(update.frame(), start, period);
                }
            }
            Ok::<_, engine_frame::SchedulerError>(update.frame())
        })
        .context("failed to spawn update thread")?;

    let render_guard = ShutdownOnDrop(handle.clone());
    let render_thread = thread::Builder::new()
        .name("render".into())
        .spawn(move || {
            let _guard = render_guard;
            while render.on_render(draw) == FrameStatus::Completed {}
            render.frame()
        })
        .context("failed to spawn render thread")?;

    // Without single step or a frame limit the threads run until the game
    // exits or an update fails.
    if single_step || max_frames > 0 {
        while (max_frames == 0 || handle.stats().frames_rendered < max_frames)
            && !handle.render_single_frame_sync().is_closing()
        {}
        handle.shutdown();
    }

    let update_result = update_thread
        .join()
        .map_err(|_| anyhow!("update thread panicked"))?;
    let rendered = render_thread
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?;
    let updated = update_result?;

    info!(updated, rendered, "threaded run complete");
    Ok(handle.stats())
}
