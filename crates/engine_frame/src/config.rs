//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// Environment variable selecting [`ThreadingMode`] (`single` or `multi`).
pub const THREADING_ENV: &str = "ENGINE_THREADING";

/// Environment variable enabling single-step mode (`1`/`true`).
pub const SINGLE_STEP_ENV: &str = "ENGINE_SINGLE_STEP";

/// How the update and render phases are mapped onto threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadingMode {
    /// Both phases run in sequence on the calling thread.
    #[default]
    Single,
    /// An update thread and a render thread hand frames to each other
    /// through gates.
    Multi,
}

/// Configuration for the frame scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Thread layout.
    pub threading: ThreadingMode,
    /// Hold every update until an external caller requests the next frame.
    pub single_step: bool,
    /// Delta time in seconds for stepped frames and the first frame.
    pub fixed_delta: f32,
    /// Warn when an update phase takes longer than this.
    pub frame_budget_ms: Option<u64>,
    /// Number of frames the host runs (0 = unlimited).
    pub max_frames: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threading: ThreadingMode::Single,
            single_step: false,
            fixed_delta: 1.0 / 60.0,
            frame_budget_ms: None,
            max_frames: 0,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Config`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, SchedulerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults with [`THREADING_ENV`] and [`SINGLE_STEP_ENV`] applied.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidEnv`] if a variable holds an
    /// unrecognised value.
    pub fn from_env() -> Result<Self, SchedulerError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply environment-style overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidEnv`] if a variable holds an
    /// unrecognised value.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SchedulerError> {
        if let Some(value) = lookup(THREADING_ENV) {
            self.threading = match value.trim().to_ascii_lowercase().as_str() {
                "single" => ThreadingMode::Single,
                "multi" => ThreadingMode::Multi,
                _ => {
                    return Err(SchedulerError::InvalidEnv {
                        key: THREADING_ENV,
                        value,
                    });
                }
            };
        }
        if let Some(value) = lookup(SINGLE_STEP_ENV) {
            self.single_step = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "" | "0" | "false" | "no" => false,
                _ => {
                    return Err(SchedulerError::InvalidEnv {
                        key: SINGLE_STEP_ENV,
                        value,
                    });
                }
            };
        }
        Ok(self)
    }

    /// Set the thread layout.
    #[must_use]
    pub fn with_threading(mut self, threading: ThreadingMode) -> Self {
        self.threading = threading;
        self
    }

    /// Enable or disable single-step mode.
    #[must_use]
    pub fn with_single_step(mut self, single_step: bool) -> Self {
        self.single_step = single_step;
        self
    }

    /// Set the fixed delta time in seconds.
    #[must_use]
    pub fn with_fixed_delta(mut self, fixed_delta: f32) -> Self {
        self.fixed_delta = fixed_delta;
        self
    }

    /// Set the update-phase budget in milliseconds.
    #[must_use]
    pub fn with_frame_budget_ms(mut self, budget_ms: u64) -> Self {
        self.frame_budget_ms = Some(budget_ms);
        self
    }

    /// Set the number of frames the host runs.
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Returns the update-phase budget, if one is set.
    #[must_use]
    pub fn frame_budget(&self) -> Option<Duration> {
        self.frame_budget_ms.map(Duration::from_millis)
    }
}
