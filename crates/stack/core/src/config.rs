//! Cache sizing configuration.

use serde::{Deserialize, Serialize};

/// Default capacity for every cache tier.
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Capacities for the block cache's four LRU tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Capacity of the decided-blocks tier.
    #[serde(default = "default_cache_size")]
    pub decided: usize,

    /// Capacity of the unverified-blocks tier.
    #[serde(default = "default_cache_size")]
    pub unverified: usize,

    /// Capacity of the negative-lookup tier.
    #[serde(default = "default_cache_size")]
    pub missing: usize,

    /// Capacity of the bytes-to-id parse dedup tier.
    #[serde(default = "default_cache_size")]
    pub bytes_to_id: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            decided: DEFAULT_CACHE_SIZE,
            unverified: DEFAULT_CACHE_SIZE,
            missing: DEFAULT_CACHE_SIZE,
            bytes_to_id: DEFAULT_CACHE_SIZE,
        }
    }
}

const fn default_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}
