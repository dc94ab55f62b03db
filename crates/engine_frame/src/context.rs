//! Per-frame context handed to game logic.

use engine_scene::World;

/// Context provided to the game callback on each update.
#[derive(Debug)]
pub struct FrameContext<'a> {
    /// The frame being updated, starting at 1.
    pub frame: u64,
    /// Delta time since the previous update, in seconds.
    pub dt: f32,
    /// The scene, owned by the update thread.
    pub world: &'a mut World,
    exit_requested: bool,
}

impl<'a> FrameContext<'a> {
    /// Create a context for one update.
    #[must_use]
    pub fn new(frame: u64, dt: f32, world: &'a mut World) -> Self {
        Self {
            frame,
            dt,
            world,
            exit_requested: false,
        }
    }

    /// Ask the scheduler to close after this frame has been synced.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Returns `true` if the game asked to exit.
    #[must_use]
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}
