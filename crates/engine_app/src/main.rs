//! # engine_app
//!
//! Demo host for the scene core. Builds an orrery scene and drives it
//! through the frame scheduler.
//!
//! ## Configuration
//!
//! An optional JSON file given as the first argument supplies a
//! [`SchedulerConfig`]. Without one the defaults apply, limited to
//! [`DEFAULT_MAX_FRAMES`] frames. `ENGINE_THREADING` (`single`/`multi`) and
//! `ENGINE_SINGLE_STEP` (`1`/`0`) override either source. Log verbosity
//! follows `RUST_LOG`.

mod demo;
mod host;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_frame::SchedulerConfig;

/// Frames run when no configuration file is given.
const DEFAULT_MAX_FRAMES: u64 = 600;

fn load_config() -> Result<SchedulerConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            SchedulerConfig::from_json_str(&json)
                .with_context(|| format!("invalid config file {path}"))?
        }
        None => SchedulerConfig::default().with_max_frames(DEFAULT_MAX_FRAMES),
    };
    Ok(config.with_overrides(|key| std::env::var(key).ok())?)
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let config = load_config()?;
    info!(
        threading = ?config.threading,
        single_step = config.single_step,
        fixed_delta = config.fixed_delta,
        max_frames = config.max_frames,
        "engine starting"
    );

    let stats = host::run(config)?;
    let summary = serde_json::to_string(&stats)?;
    info!(stats = %summary, "engine shut down");
    Ok(())
}
