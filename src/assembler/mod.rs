//!
//! Block assembly on top of a `ChainRpc` transport.
//!
//! A block is produced by a small state machine:
//!
//! ```text
//! Resolving -> FetchingSummary -> Hydrating -> Assembled
//!     \              \                \
//!      `--------------`----------------`----> Failed
//! ```
//!
//! `Hydrating` fetches every transaction listed by the verbosity-1
//! summary. A transaction the node reports as not found is skipped, any
//! other error fails the whole block.
//!
//! Chains that have no special transactions below some height take the
//! legacy route for such heights: one full-verbosity `getblock` and no
//! hydration.
//!
mod hydrate;

use crate::coins::BlockFetch;
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use crate::parser::proto::block::{Block, BlockHeader};
use crate::parser::proto::tx::Tx;
use crate::rpc::{BlockBody, ChainRpc, Verbosity};
pub use hydrate::Hydration;
use hydrate::Hydrator;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// Identifies the block to assemble.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub enum BlockRef {
    Hash(String),
    Height(u32),
}

impl From<u32> for BlockRef {
    fn from(height: u32) -> Self {
        BlockRef::Height(height)
    }
}

impl From<&str> for BlockRef {
    fn from(hash: &str) -> Self {
        BlockRef::Hash(hash.to_string())
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockRef::Hash(hash) => write!(f, "hash {}", hash),
            BlockRef::Height(height) => write!(f, "height {}", height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// single full-verbosity `getblock`
    Legacy,
    /// verbosity-1 summary followed by one fetch per transaction
    Hydrated,
}

///
/// Pick the fetch route for `block`.
///
/// Only a bare height can be routed to the legacy path on a chain with
/// special transactions: a caller holding a hash gets the hydrated path.
///
pub fn route(fetch: BlockFetch, block: &BlockRef) -> Route {
    match (fetch, block) {
        (BlockFetch::Full, _) => Route::Legacy,
        (BlockFetch::SpecialTxAware { special_tx_height }, BlockRef::Height(height))
            if *height < special_tx_height =>
        {
            Route::Legacy
        }
        (BlockFetch::SpecialTxAware { .. }, _) => Route::Hydrated,
    }
}

///
/// An assembled block, with the txids left out of it.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct AssembledBlock {
    pub block: Block,
    /// txids omitted because the node could not serve them, in block order
    pub skipped: Vec<String>,
}

enum State {
    Resolving(BlockRef),
    FetchingSummary(String),
    Hydrating {
        header: BlockHeader,
        txids: Vec<String>,
    },
    Assembled(AssembledBlock),
    Failed(OpError),
}

pub struct BlockAssembler {
    fetch: BlockFetch,
    hydrator: Hydrator,
}

impl BlockAssembler {
    ///
    /// Assembler fetching transactions one after the other.
    ///
    pub fn new(fetch: BlockFetch) -> Self {
        BlockAssembler {
            fetch,
            hydrator: Hydrator::Sequential,
        }
    }

    ///
    /// Assembler fetching the transactions of a block on `threads` workers.
    ///
    pub fn parallel(fetch: BlockFetch, threads: usize) -> OpResult<Self> {
        Ok(BlockAssembler {
            fetch,
            hydrator: Hydrator::parallel(threads)?,
        })
    }

    #[inline]
    pub fn block_fetch(&self) -> BlockFetch {
        self.fetch
    }

    pub fn assemble_block<R: ChainRpc + ?Sized>(
        &self,
        rpc: &R,
        block: BlockRef,
    ) -> OpResult<Block> {
        Ok(self.assemble(rpc, block)?.block)
    }

    pub fn assemble<R: ChainRpc + ?Sized>(
        &self,
        rpc: &R,
        block: BlockRef,
    ) -> OpResult<AssembledBlock> {
        if route(self.fetch, &block) == Route::Legacy {
            return legacy_block(rpc, block);
        }
        let mut state = State::Resolving(block);
        loop {
            state = match state {
                State::Resolving(BlockRef::Hash(hash)) => State::FetchingSummary(hash),
                State::Resolving(BlockRef::Height(height)) => match rpc.get_block_hash(height) {
                    Ok(hash) => State::FetchingSummary(hash),
                    Err(e) => State::Failed(e.join_msg(&format!("height {}", height))),
                },
                State::FetchingSummary(hash) => match fetch_summary(rpc, &hash) {
                    Ok((header, txids)) => State::Hydrating { header, txids },
                    Err(e) => State::Failed(e.join_msg(&format!("hash {}", hash))),
                },
                State::Hydrating { header, txids } => match self.hydrator.hydrate(rpc, &txids) {
                    Ok((txs, skipped)) => State::Assembled(AssembledBlock {
                        block: Block { header, txs },
                        skipped,
                    }),
                    Err(e) => State::Failed(e.join_msg(&format!("hash {}", header.hash))),
                },
                State::Assembled(assembled) => return Ok(assembled),
                State::Failed(e) => return Err(e),
            }
        }
    }
}

fn fetch_summary<R: ChainRpc + ?Sized>(
    rpc: &R,
    hash: &str,
) -> OpResult<(BlockHeader, Vec<String>)> {
    debug!("rpc: getblock (verbosity={}) {}", Verbosity::Summary, hash);
    let block = rpc.get_block(hash, Verbosity::Summary)?;
    match block.body {
        BlockBody::Txids(txids) => Ok((block.header, txids)),
        BlockBody::Transactions(_) => Err(OpError::new(OpErrorKind::Transport)
            .join_msg("getblock returned transactions for a summary request")),
    }
}

fn legacy_block<R: ChainRpc + ?Sized>(rpc: &R, block: BlockRef) -> OpResult<AssembledBlock> {
    let hash = match block {
        BlockRef::Hash(hash) => hash,
        BlockRef::Height(height) => rpc
            .get_block_hash(height)
            .map_err(|e| e.join_msg(&format!("height {}", height)))?,
    };
    debug!("rpc: getblock (verbosity={}) {}", Verbosity::Full, hash);
    let full = rpc
        .get_block(&hash, Verbosity::Full)
        .map_err(|e| e.join_msg(&format!("hash {}", hash)))?;
    let txs: Vec<Tx> = match full.body {
        BlockBody::Transactions(txs) => txs,
        BlockBody::Txids(_) => {
            return Err(OpError::new(OpErrorKind::Transport)
                .join_msg("getblock returned txids for a full request")
                .join_msg(&format!("hash {}", hash)))
        }
    };
    Ok(AssembledBlock {
        block: Block {
            header: full.header,
            txs,
        },
        skipped: Vec::new(),
    })
}
