//!
//! Crates APIs, essential structs, functions, methods are all here!
//!
//! Everything starts from a `CoinAdapter`: build one from the adapter
//! configuration, a `ChainRpc` transport and the process-wide
//! `ChainRegistry`, then call `initialize()` once before serving requests.
//!
//! # Example
//!
//! ```rust
//! use coin_adapters::{AdapterConfig, BlockRef, ChainRegistry, CoinAdapter};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ChainRegistry::new());
//! let config = AdapterConfig::from_json(r#"{"coin_name": "scrypta"}"#).unwrap();
//! let mut adapter = CoinAdapter::new(config, my_rpc, registry).unwrap();
//! adapter.initialize().unwrap();
//!
//! let block = adapter.get_block(BlockRef::Height(454000)).unwrap();
//! ```
//!

mod extensions;

use crate::assembler::BlockAssembler;
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use crate::parser::pack;
use crate::parser::script::{address_to_script, evaluate_script};
use bitcoin::hashes::hex::FromHex;
use bitcoin::Script;
use log::info;
use std::sync::Arc;
// re-exports
pub use crate::assembler::{route, AssembledBlock, BlockRef, Hydration, Route};
pub use crate::coins::{find_coin, BlockFetch, Capability, CoinSpec, ALL_COINS};
pub use crate::config::AdapterConfig;
pub use crate::parser::chain_params::{ChainParams, ChainRegistry};
pub use crate::parser::errors::{OpError as Error, OpErrorKind as ErrorKind};
pub use crate::parser::proto::block::{Block, BlockHeader, BlockSummary};
pub use crate::parser::proto::tx::{ScriptPubKey, ScriptSig, Tx, Vin, Vout};
pub use crate::parser::script::{ScriptInfo, ScriptType};
pub use crate::rpc::{BlockBody, ChainInfo, ChainRpc, RpcBlock, Verbosity};
pub use bitcoin::hashes::hex::ToHex;

/// network name reported to the indexing backend
const NETWORK: &str = "livenet";

///
/// Adapter for one chain.
///
/// Chains differ only by their `CoinSpec` row; there is no per-chain
/// adapter type.
///
pub struct CoinAdapter<R: ChainRpc> {
    coin: &'static CoinSpec,
    config: AdapterConfig,
    rpc: R,
    registry: Arc<ChainRegistry>,
    assembler: BlockAssembler,
    params: Option<Arc<ChainParams>>,
}

impl<R: ChainRpc> CoinAdapter<R> {
    ///
    /// Build the adapter for `config.coin_name`.
    ///
    /// No RPC call is made until `initialize()`.
    ///
    pub fn new(config: AdapterConfig, rpc: R, registry: Arc<ChainRegistry>) -> OpResult<Self> {
        let coin = config.coin()?;
        let fetch = config.block_fetch(coin);
        let assembler = if config.parallel_hydration {
            BlockAssembler::parallel(fetch, config.hydration_threads())?
        } else {
            BlockAssembler::new(fetch)
        };
        Ok(CoinAdapter {
            coin,
            config,
            rpc,
            registry,
            assembler,
            params: None,
        })
    }

    ///
    /// Ask the node which chain it runs and resolve its parameters.
    ///
    /// Any error here means the adapter must not serve requests: the node
    /// is unreachable, or the registry holds different parameters for
    /// this network.
    ///
    pub fn initialize(&mut self) -> OpResult<()> {
        let info = self.rpc.get_chain_info()?;
        let params = self
            .registry
            .lookup(self.coin, &info.chain)
            .map_err(|e| e.join_msg(&format!("coin {}", self.coin.name)))?;
        info!("rpc: block chain {}", params.name);
        self.params = Some(params);
        Ok(())
    }

    #[inline]
    pub fn coin(&self) -> &'static CoinSpec {
        self.coin
    }

    #[inline]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    #[inline]
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    ///
    /// Parameters resolved by `initialize()`.
    ///
    pub fn params(&self) -> OpResult<&Arc<ChainParams>> {
        self.params.as_ref().ok_or_else(|| {
            OpError::new(OpErrorKind::Configuration)
                .join_msg(&format!("{} adapter not initialized", self.coin.name))
        })
    }

    #[inline]
    pub fn network(&self) -> &'static str {
        NETWORK
    }

    #[inline]
    pub fn is_testnet(&self) -> bool {
        false
    }

    #[inline]
    pub fn supports_estimate_smart_fee(&self) -> bool {
        self.config.supports_estimate_smart_fee
    }

    ///
    /// Get a block by hash or height, without the transactions the node
    /// cannot serve individually.
    ///
    pub fn get_block(&self, block: BlockRef) -> OpResult<Block> {
        self.assembler.assemble_block(&self.rpc, block)
    }

    ///
    /// Like `get_block()`, also reporting which txids were left out.
    ///
    pub fn get_assembled_block(&self, block: BlockRef) -> OpResult<AssembledBlock> {
        self.assembler.assemble(&self.rpc, block)
    }

    pub fn get_transaction_for_mempool(&self, txid: &str) -> OpResult<Tx> {
        self.rpc
            .get_transaction(txid)
            .map_err(|e| e.join_msg(&format!("txid {}", txid)))
    }

    #[inline]
    pub fn pack_tx(&self, tx: &Tx, height: u32, block_time: i64) -> OpResult<Vec<u8>> {
        pack::pack_tx(tx, height, block_time)
    }

    #[inline]
    pub fn unpack_tx(&self, buf: &[u8]) -> OpResult<(Tx, u32)> {
        pack::unpack_tx(buf)
    }

    ///
    /// Extract addresses from a hex script public key.
    ///
    pub fn addresses_from_script(&self, script_pub_key: &str) -> OpResult<ScriptInfo> {
        let script = Script::from_hex(script_pub_key)?;
        Ok(evaluate_script(&script, self.params()?))
    }

    ///
    /// Output script paying to `address`.
    ///
    pub fn script_from_address(&self, address: &str) -> OpResult<Vec<u8>> {
        Ok(address_to_script(address, self.params()?)?.to_bytes())
    }
}
