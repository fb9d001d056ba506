//! Backend contract and engine surface for the keel chain-VM stack.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/keel-chain/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ChainError;

mod block;
pub use block::StatelessBlock;

mod backend;
pub use backend::{ApiHandler, ChainBackend, Decider, NoopDecider, VmBackend, VmState};

mod engine;
pub use engine::{engine_channel, EngineMessage, EngineReceiver, EngineSender};
