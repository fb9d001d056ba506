//! Core domain types shared across keel.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/keel-chain/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod idents;
pub use idents::{BlockId, Idents};

mod status;
pub use status::Status;
