use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BUFFERED: usize = 1024;
pub const DEFAULT_STALL_TIMEOUT_MS: u64 = 10_000;

/// Tunables for the reorder buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Early events held at most; beyond this the gap is reported.
    pub max_buffered: usize,
    /// How long buffered events may wait without the cursor moving.
    pub stall_timeout_ms: u64,
}

impl EngineConfig {
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_buffered: DEFAULT_MAX_BUFFERED,
            stall_timeout_ms: DEFAULT_STALL_TIMEOUT_MS,
        }
    }
}
