//! Render-boundary error types.

use engine_scene::{ProxyId, SceneError};

/// Errors raised while pushing scene state into renderer proxies.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProxyError {
    /// The render backend refused a proxy write.
    #[error("render backend rejected {proxy}: {reason}")]
    Rejected {
        /// The proxy being written.
        proxy: ProxyId,
        /// Backend-provided explanation.
        reason: String,
    },

    /// The scene could not produce the data for a proxy.
    #[error(transparent)]
    Scene(#[from] SceneError),
}
