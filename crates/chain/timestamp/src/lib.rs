//! Timestamp chain backend for the keel stack.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/keel-chain/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod block;
pub use block::{DataHash, TimestampBlock};

mod config;
pub use config::{VmConfig, DEFAULT_FUTURE_SLACK_SECS};

mod state;
pub use state::ChainState;

mod vm;
pub use vm::{ChainDecider, TimestampVm, VM_NAME, VM_VERSION};

mod service;
pub use service::{
    GetBlockArgs, GetBlockReply, ProposeBlockArgs, ProposeBlockReply, TimestampApiServer,
    TimestampService,
};
