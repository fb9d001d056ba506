//! Abstract key-value storage for keel chain backends.
#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/keel-chain/keel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::KvError;

mod database;
pub use database::{BatchOp, Database};

mod memory;
pub use memory::MemDb;

mod prefix;
pub use prefix::PrefixDb;

mod versioned;
pub use versioned::Versioned;
