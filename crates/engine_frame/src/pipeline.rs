//! The update phase.
//!
//! One update runs, strictly in this order:
//!
//! 1. Game logic, through a [`FrameContext`].
//! 2. [`propagate_up`], then [`propagate_down`].
//! 3. The lifecycle sweep ([`World::collect_garbage`]).
//! 4. [`SyncEngine::sync`] into the proxy sink.
//!
//! Only after step 4 may the render phase of the same frame begin.

use std::time::{Duration, Instant};

use engine_render::{ProxySink, SyncEngine, SyncReport};
use engine_scene::{GarbageReport, SceneError, World, propagate_down, propagate_up};
use tracing::{debug, warn};

use crate::context::FrameContext;
use crate::error::SchedulerError;

/// What one update phase did.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOutcome {
    /// The frame number.
    pub frame: u64,
    /// Result of the sync step.
    pub sync: SyncReport,
    /// Result of the lifecycle sweep.
    pub garbage: GarbageReport,
    /// The game asked to exit during this frame.
    pub exit_requested: bool,
    /// Wall time spent in the phase.
    pub elapsed: Duration,
}

/// Owns the scene and runs the update phase.
#[derive(Debug)]
pub struct UpdatePipeline {
    world: World,
    sync: SyncEngine,
    frame: u64,
    last_update: Option<Instant>,
    budget: Option<Duration>,
}

impl UpdatePipeline {
    /// Create a pipeline owning `world`. Updates slower than `budget` are
    /// logged.
    #[must_use]
    pub fn new(world: World, budget: Option<Duration>) -> Self {
        Self {
            world,
            sync: SyncEngine::new(),
            frame: 0,
            last_update: None,
            budget,
        }
    }

    /// Returns the scene.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns the scene for mutation between frames.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns the number of the last frame started.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Delta time for the next update: `fixed` if given, otherwise the time
    /// since the previous update, or `first` for the very first one.
    pub fn next_delta(&mut self, fixed: Option<f32>, first: f32) -> f32 {
        let now = Instant::now();
        let measured = self
            .last_update
            .map(|last| now.duration_since(last).as_secs_f32());
        self.last_update = Some(now);
        fixed.or(measured).unwrap_or(first)
    }

    /// Run one update phase.
    ///
    /// # Errors
    ///
    /// Returns the game callback's error, or [`SchedulerError::Scene`] /
    /// [`SchedulerError::Proxy`] if the sweep or sync fails. The scene may
    /// have been partially updated; callers treat every error as fatal.
    pub fn run<S, G>(&mut self, dt: f32, sink: &S, game: G) -> Result<UpdateOutcome, SchedulerError>
    where
        S: ProxySink,
        G: FnOnce(&mut FrameContext<'_>) -> Result<(), SceneError>,
    {
        let start = Instant::now();
        self.frame += 1;
        let frame = self.frame;
        debug!(frame, dt, "update start");

        let mut ctx = FrameContext::new(frame, dt, &mut self.world);
        game(&mut ctx)?;
        let exit_requested = ctx.exit_requested();

        let processed = propagate_up(&mut self.world);
        let ready = propagate_down(&mut self.world);
        let garbage = self.world.collect_garbage()?;
        let sync = self.sync.sync(&mut self.world, sink)?;

        let elapsed = start.elapsed();
        debug!(
            frame,
            processed,
            ready,
            destroyed = garbage.total(),
            writes = sync.writes(),
            "update complete"
        );
        if let Some(budget) = self.budget
            && elapsed > budget
        {
            warn!(
                frame,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "update exceeded frame budget"
            );
        }

        Ok(UpdateOutcome {
            frame,
            sync,
            garbage,
            exit_requested,
            elapsed,
        })
    }
}
