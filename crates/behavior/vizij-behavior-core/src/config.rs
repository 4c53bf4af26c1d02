//! Core configuration for vizij-behavior-core.

use serde::{Deserialize, Serialize};

/// Default minimum index change a frame stepper reports at once.
pub const DEFAULT_RATE_LIMIT: f32 = 0.1;

/// Configuration shared by every controller created against one [`crate::Host`].
/// Keep this minimal; per-animation settings come from behavior descriptors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stepping-rate limit handed to every frame stepper, in frames.
    pub rate_limit: f32,
    /// Initial value of each controller's `debug` flag (per-index tracing).
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
            debug: false,
        }
    }
}
