//!
//! Interface to the node's RPC transport.
//!
//! This crate never opens connections. A transport implements `ChainRpc`
//! and owns connection handling, authentication and retries; the adapters
//! only issue calls and interpret results.
//!
//! Errors are reported through `OpError` kinds:
//! - `NotFound` when the requested hash, height or transaction does not exist;
//! - `Rpc { code }` when the node answered with an error object;
//! - `Transport` for anything that went wrong on the way.
//!
use crate::parser::errors::OpResult;
use crate::parser::proto::block::{BlockHeader, BlockSummary};
use crate::parser::proto::tx::Tx;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct ChainInfo {
    /// chain name as reported by `getblockchaininfo`, e.g. `main`
    pub chain: String,
    #[serde(default)]
    pub blocks: u32,
    #[serde(default, rename = "bestblockhash")]
    pub best_block_hash: String,
}

///
/// `getblock` verbosity levels.
///
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verbosity {
    /// header fields and txids
    Summary = 1,
    /// header fields and full transactions
    Full = 2,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub enum BlockBody {
    Txids(Vec<String>),
    Transactions(Vec<Tx>),
}

///
/// A `getblock` response.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct RpcBlock {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl From<BlockSummary> for RpcBlock {
    fn from(summary: BlockSummary) -> Self {
        RpcBlock {
            header: summary.header,
            body: BlockBody::Txids(summary.txids),
        }
    }
}

///
/// Request/response calls the adapters need from a node.
///
/// Implementations must be shareable between threads: transactions of one
/// block may be fetched concurrently.
///
pub trait ChainRpc: Send + Sync {
    fn get_chain_info(&self) -> OpResult<ChainInfo>;

    /// `NotFound` if `height` is beyond the node's best chain.
    fn get_block_hash(&self, height: u32) -> OpResult<String>;

    fn get_block(&self, hash: &str, verbosity: Verbosity) -> OpResult<RpcBlock>;

    /// `NotFound` if the node cannot serve this transaction.
    fn get_transaction(&self, txid: &str) -> OpResult<Tx>;

    ///
    /// Generic call for chain-specific methods without typed wrappers.
    ///
    fn call(&self, method: &str, params: &[serde_json::Value]) -> OpResult<serde_json::Value>;
}

impl<T: ChainRpc + ?Sized> ChainRpc for Arc<T> {
    fn get_chain_info(&self) -> OpResult<ChainInfo> {
        (**self).get_chain_info()
    }

    fn get_block_hash(&self, height: u32) -> OpResult<String> {
        (**self).get_block_hash(height)
    }

    fn get_block(&self, hash: &str, verbosity: Verbosity) -> OpResult<RpcBlock> {
        (**self).get_block(hash, verbosity)
    }

    fn get_transaction(&self, txid: &str) -> OpResult<Tx> {
        (**self).get_transaction(txid)
    }

    fn call(&self, method: &str, params: &[serde_json::Value]) -> OpResult<serde_json::Value> {
        (**self).call(method, params)
    }
}
