//! # engine_frame
//!
//! Frame pacing for the scene core.
//!
//! Each frame has an update phase (game logic, dirty propagation, lifecycle
//! sweep, proxy sync; see [`UpdatePipeline`]) and a render phase (draw from
//! proxies, then sweep orphaned proxies). [`FrameScheduler`] runs them on
//! one thread; [`FrameScheduler::split`] hands them to two threads that pass
//! frames to each other through [`FrameGates`].
//!
//! Shutdown is cooperative: [`SchedulerHandle::shutdown`] sets a closing
//! flag and signals every gate, and each phase returns
//! [`FrameStatus::Closing`] as soon as it wakes.

pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod scheduler;
pub mod stats;

pub use config::{SINGLE_STEP_ENV, SchedulerConfig, THREADING_ENV, ThreadingMode};
pub use context::FrameContext;
pub use error::SchedulerError;
pub use gate::{FrameGates, Gate};
pub use pipeline::{UpdateOutcome, UpdatePipeline};
pub use scheduler::{FrameScheduler, FrameStatus, RenderDriver, SchedulerHandle, UpdateDriver};
pub use stats::FrameStats;
