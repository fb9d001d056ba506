//! Timestamp VM configuration.

use keel_stack::DEFAULT_MEMPOOL_CAPACITY;
use keel_traits::ChainError;
use serde::{Deserialize, Serialize};

/// Default tolerance by which a block timestamp may exceed local time.
pub const DEFAULT_FUTURE_SLACK_SECS: u64 = 60;

/// Configuration supplied to the VM through its initialize config bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmConfig {
    /// Number of pending payload fingerprints the mempool holds.
    #[serde(default = "default_mempool_capacity")]
    pub mempool_capacity: usize,

    /// Seconds a block timestamp may run ahead of local time.
    #[serde(default = "default_future_slack")]
    pub future_slack_seconds: u64,
}

impl VmConfig {
    /// Parse configuration from the initialize config bytes (JSON).
    ///
    /// Empty bytes select the defaults.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|err| ChainError::Config(err.to_string()))
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            mempool_capacity: DEFAULT_MEMPOOL_CAPACITY,
            future_slack_seconds: DEFAULT_FUTURE_SLACK_SECS,
        }
    }
}

const fn default_mempool_capacity() -> usize {
    DEFAULT_MEMPOOL_CAPACITY
}

const fn default_future_slack() -> u64 {
    DEFAULT_FUTURE_SLACK_SECS
}
