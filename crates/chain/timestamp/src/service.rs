//! JSON-RPC service for the timestamp chain.

use alloy_primitives::{hex, B256};
use jsonrpsee::{
    core::{async_trait, RpcResult},
    proc_macros::rpc,
    types::ErrorObjectOwned,
};
use keel_domain::BlockId;
use keel_kv::Database;
use keel_stack::MempoolError;
use keel_traits::{ChainBackend as _, StatelessBlock as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{DataHash, TimestampVm};

/// JSON-RPC error codes used by the service.
mod codes {
    /// Invalid method parameter(s).
    pub(crate) const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub(crate) const INTERNAL_ERROR: i32 = -32603;
    /// Resource not found.
    pub(crate) const RESOURCE_NOT_FOUND: i32 = -32001;
}

/// Errors surfaced to RPC clients.
#[derive(Debug, Error)]
enum ServiceError {
    /// The request payload could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The requested block is unknown.
    #[error("block not found")]
    BlockNotFound,

    /// The VM failed internally.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ErrorObjectOwned {
    fn from(err: ServiceError) -> Self {
        let code = match &err {
            ServiceError::InvalidPayload(_) => codes::INVALID_PARAMS,
            ServiceError::BlockNotFound => codes::RESOURCE_NOT_FOUND,
            ServiceError::Internal(_) => codes::INTERNAL_ERROR,
        };
        ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
    }
}

/// Arguments for `timestamp_proposeBlock`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposeBlockArgs {
    /// Hex-encoded payload of at most 32 bytes.
    pub data: String,
}

/// Reply for `timestamp_proposeBlock`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProposeBlockReply {
    /// Whether the payload was queued for inclusion.
    pub success: bool,
}

/// Arguments for `timestamp_getBlock`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GetBlockArgs {
    /// Hex-encoded 32-byte block id; empty or absent selects the last
    /// accepted block.
    #[serde(default)]
    pub id: Option<String>,
}

/// Reply for `timestamp_getBlock`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetBlockReply {
    /// Block id.
    pub id: String,
    /// Parent block id.
    #[serde(rename = "parentID")]
    pub parent_id: String,
    /// Block height.
    pub height: u64,
    /// Proposal time in unix seconds.
    pub timestamp: i64,
    /// Hex-encoded payload fingerprint.
    pub data: String,
}

/// The `timestamp` JSON-RPC API.
#[rpc(server, namespace = "timestamp")]
pub trait TimestampApi {
    /// Queue a payload fingerprint for inclusion in a future block.
    ///
    /// Returns `success = false` when the mempool is full.
    #[method(name = "proposeBlock")]
    async fn propose_block(&self, args: ProposeBlockArgs) -> RpcResult<ProposeBlockReply>;

    /// Fetch an accepted block by id, defaulting to the last accepted.
    #[method(name = "getBlock")]
    async fn get_block(&self, args: GetBlockArgs) -> RpcResult<GetBlockReply>;
}

/// Implementation of the `timestamp` RPC API over a [`TimestampVm`].
#[derive(Clone, Debug)]
pub struct TimestampService<D: Database> {
    vm: TimestampVm<D>,
}

impl<D: Database> TimestampService<D> {
    /// Create a service over `vm`.
    pub fn new(vm: TimestampVm<D>) -> Self {
        Self { vm }
    }
}

#[async_trait]
impl<D: Database> TimestampApiServer for TimestampService<D> {
    async fn propose_block(&self, args: ProposeBlockArgs) -> RpcResult<ProposeBlockReply> {
        let payload = decode_hex(&args.data)?;
        let data_hash = DataHash::from_payload(&payload)
            .map_err(|err| ServiceError::InvalidPayload(err.to_string()))?;

        let mempool =
            self.vm.mempool().map_err(|err| ServiceError::Internal(err.to_string()))?;
        match mempool.add(data_hash) {
            Ok(()) => Ok(ProposeBlockReply { success: true }),
            Err(MempoolError::Full { capacity }) => {
                debug!(capacity, "propose rejected, mempool full");
                Ok(ProposeBlockReply { success: false })
            }
        }
    }

    async fn get_block(&self, args: GetBlockArgs) -> RpcResult<GetBlockReply> {
        let id = match args.id.as_deref() {
            Some(id) if !id.is_empty() => parse_block_id(id)?,
            _ => self.vm.last_accepted().await.map_err(|err| {
                if err.is_not_found() {
                    ServiceError::BlockNotFound
                } else {
                    ServiceError::Internal(err.to_string())
                }
            })?,
        };

        let block = self.vm.get_block(id).await.map_err(|err| {
            if err.is_not_found() {
                ServiceError::BlockNotFound
            } else {
                ServiceError::Internal(err.to_string())
            }
        })?;

        Ok(GetBlockReply {
            id: block.id().to_string(),
            parent_id: block.parent().to_string(),
            height: block.height(),
            timestamp: block.timestamp(),
            data: block.data_hash().to_string(),
        })
    }
}

fn decode_hex(data: &str) -> Result<Vec<u8>, ServiceError> {
    hex::decode(data.trim_start_matches("0x"))
        .map_err(|err| ServiceError::InvalidPayload(err.to_string()))
}

fn parse_block_id(id: &str) -> Result<BlockId, ServiceError> {
    let bytes = decode_hex(id)?;
    if bytes.len() != 32 {
        return Err(ServiceError::InvalidPayload(format!(
            "block id is {} bytes, expected 32",
            bytes.len()
        )));
    }
    Ok(BlockId(B256::from_slice(&bytes)))
}

#[cfg(test)]
mod tests {
    use keel_kv::MemDb;
    use keel_traits::{engine_channel, VmBackend as _};

    use super::*;

    async fn service_with_config(config: &[u8]) -> TimestampService<MemDb> {
        let vm = TimestampVm::new(MemDb::new());
        let (engine, _rx) = engine_channel();
        vm.initialize(&[0x01, 0x02, 0x03, 0x04, 0x05], config, engine).await.unwrap();
        TimestampService::new(vm)
    }

    async fn service() -> TimestampService<MemDb> {
        service_with_config(b"").await
    }

    #[tokio::test]
    async fn propose_block_queues_payload() {
        let service = service().await;
        let reply = service
            .propose_block(ProposeBlockArgs { data: "0x0504030201".to_string() })
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(service.vm.mempool().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn propose_block_reports_full_mempool() {
        let service = service_with_config(br#"{"mempool_capacity": 1}"#).await;

        let args = ProposeBlockArgs { data: "0x01".to_string() };
        assert!(service.propose_block(args.clone()).await.unwrap().success);
        assert!(!service.propose_block(args).await.unwrap().success);
    }

    #[tokio::test]
    async fn propose_block_rejects_bad_hex() {
        let service = service().await;
        let err = service
            .propose_block(ProposeBlockArgs { data: "zz".to_string() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn propose_block_rejects_oversized_payload() {
        let service = service().await;
        let data = format!("0x{}", "00".repeat(33));
        let err = service.propose_block(ProposeBlockArgs { data }).await.unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn get_block_defaults_to_last_accepted() {
        let service = service().await;
        let reply = service.get_block(GetBlockArgs::default()).await.unwrap();

        assert_eq!(reply.height, 0);
        assert_eq!(reply.timestamp, 0);
        assert_eq!(reply.parent_id, BlockId::EMPTY.to_string());
        assert!(reply.data.starts_with("0x0102030405"));
    }

    #[tokio::test]
    async fn get_block_by_explicit_id() {
        let service = service().await;
        let genesis_id = service.vm.last_accepted().await.unwrap();

        let reply = service
            .get_block(GetBlockArgs { id: Some(genesis_id.to_string()) })
            .await
            .unwrap();
        assert_eq!(reply.id, genesis_id.to_string());
    }

    #[tokio::test]
    async fn get_block_unknown_id_is_not_found() {
        let service = service().await;
        let id = BlockId::of_bytes(b"missing").to_string();
        let err = service.get_block(GetBlockArgs { id: Some(id) }).await.unwrap_err();
        assert_eq!(err.code(), codes::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn get_block_rejects_malformed_id() {
        let service = service().await;
        let err = service
            .get_block(GetBlockArgs { id: Some("0xabcd".to_string()) })
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
    }
}
