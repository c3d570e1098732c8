//!
//! # Introduction
//!
//! Chain adapters for Bitcoin-derived daemons, used by an indexing
//! backend to read blocks and transactions over the node's RPC interface.
//!
//! It resolves per-chain network parameters, assembles blocks
//! on chains whose nodes cannot serve every transaction of a block,
//! packs transactions into a compact storage format, and derives
//! addresses from output scripts with the chain's version bytes.
//!
//! Supported chains are rows of a capability table (`ALL_COINS`), a
//! single generic `CoinAdapter` serves all of them.
//!
//! ## Caveat
//!
//! This crate does not open connections: bring your own `ChainRpc`.
//!
//! # Example
//!
//! ```rust
//! use coin_adapters::{AdapterConfig, BlockRef, ChainRegistry, CoinAdapter};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ChainRegistry::new());
//! let config = AdapterConfig::new("harcomia");
//! let mut adapter = CoinAdapter::new(config, my_rpc, registry).unwrap();
//! adapter.initialize().unwrap();
//!
//! let block = adapter.get_block(BlockRef::Height(600000)).unwrap();
//! let packed = adapter.pack_tx(&block.txs[0], 600000, block.header.time).unwrap();
//! ```
//!

pub(crate) mod api;
pub mod assembler;
pub mod coins;
pub mod config;
pub mod parser;
pub mod rpc;

#[doc(inline)]
pub use crate::api::*;
