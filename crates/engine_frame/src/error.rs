//! Scheduler error types.

use engine_render::ProxyError;
use engine_scene::SceneError;

/// Errors that can stop the frame scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A scene operation failed during the update phase.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The sync step failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    /// A JSON configuration document could not be parsed.
    #[error("invalid scheduler config: {0}")]
    Config(#[from] serde_json::Error),

    /// An environment override held an unrecognised value.
    #[error("invalid value {value:?} for {key}")]
    InvalidEnv {
        /// The environment variable.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl SchedulerError {
    /// Returns `true` if the error reports broken lifecycle bookkeeping
    /// rather than a rejected request.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::Scene(err) | Self::Proxy(ProxyError::Scene(err)) => err.is_invariant_violation(),
            _ => false,
        }
    }
}
