//! Block lifecycle core for the keel chain-VM stack.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/keel-chain/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod lru;
pub use lru::LruCache;

mod mempool;
pub use mempool::{Mempool, MempoolError, DEFAULT_MEMPOOL_CAPACITY};

mod block;
pub use block::WrappedBlock;

mod cache;
pub use cache::{BlockCache, SharedBlock};

mod config;
pub use config::{CacheConfig, DEFAULT_CACHE_SIZE};

mod vm;
pub use vm::ChainVm;
