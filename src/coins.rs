//!
//! Supported chains.
//!
//! Every chain is one `CoinSpec` row. Adapters differ only in the values
//! found here: network identity, address version bytes, the height below
//! which the chain had no special transactions, and optional RPC
//! extensions.
//!
use crate::parser::chain_params::ChainParams;
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use serde::Serialize;

///
/// Chain-specific RPC calls an adapter may offer on top of the common set.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// `masternodelist`, returning the node's raw payload.
    MasternodeList,
}

///
/// How blocks of a chain are fetched.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockFetch {
    /// Single full-verbosity `getblock` for every block.
    Full,
    /// Full-verbosity `getblock` below `special_tx_height` when only a
    /// height is known, summary plus per-transaction fetches otherwise.
    SpecialTxAware { special_tx_height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinSpec {
    pub name: &'static str,
    /// lower-case names accepted in configuration
    pub aliases: &'static [&'static str],
    pub net: u32,
    pub pub_key_hash_addr_id: &'static [u8],
    pub script_hash_addr_id: &'static [u8],
    pub block_fetch: BlockFetch,
    pub capabilities: &'static [Capability],
}

impl CoinSpec {
    pub fn main_params(&self) -> ChainParams {
        ChainParams {
            name: self.name.to_string(),
            net: self.net,
            pub_key_hash_addr_id: self.pub_key_hash_addr_id.to_vec(),
            script_hash_addr_id: self.script_hash_addr_id.to_vec(),
        }
    }

    #[inline]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.name.to_ascii_lowercase() == name || self.aliases.iter().any(|a| *a == name)
    }
}

/// first height at which Scrypta-family chains carry special transactions
const FIRST_BLOCK_WITH_SPECIAL_TRANSACTIONS: u32 = 454000;

pub const SCRYPTA: CoinSpec = CoinSpec {
    name: "Scrypta",
    aliases: &["scrypta", "lyra"],
    net: 0xe92caf4c,
    pub_key_hash_addr_id: &[48],
    script_hash_addr_id: &[13],
    block_fetch: BlockFetch::SpecialTxAware {
        special_tx_height: FIRST_BLOCK_WITH_SPECIAL_TRANSACTIONS,
    },
    capabilities: &[Capability::MasternodeList],
};

pub const HARCOMIA: CoinSpec = CoinSpec {
    name: "Harcomia",
    aliases: &["harcomia", "itl"],
    net: 0x0c01acc1,
    pub_key_hash_addr_id: &[100],
    script_hash_addr_id: &[87],
    block_fetch: BlockFetch::SpecialTxAware {
        special_tx_height: FIRST_BLOCK_WITH_SPECIAL_TRANSACTIONS,
    },
    capabilities: &[],
};

pub const KNOXFS: CoinSpec = CoinSpec {
    name: "KnoxFS",
    aliases: &["knoxfs", "kfx"],
    net: 0xa6e4d14e,
    pub_key_hash_addr_id: &[23],
    script_hash_addr_id: &[83],
    block_fetch: BlockFetch::Full,
    capabilities: &[],
};

pub const XAP: CoinSpec = CoinSpec {
    name: "XAP",
    aliases: &["xap"],
    net: 0xfdebd190,
    pub_key_hash_addr_id: &[23],
    script_hash_addr_id: &[85],
    block_fetch: BlockFetch::Full,
    capabilities: &[],
};

pub const LIQUID: CoinSpec = CoinSpec {
    name: "Liquid",
    aliases: &["liquid", "lbtc"],
    net: 0xdab5bffa,
    pub_key_hash_addr_id: &[57],
    script_hash_addr_id: &[39],
    block_fetch: BlockFetch::Full,
    capabilities: &[],
};

pub const ALL_COINS: &[&CoinSpec] = &[&SCRYPTA, &HARCOMIA, &KNOXFS, &XAP, &LIQUID];

///
/// Find a coin by name or alias, case-insensitively.
///
pub fn find_coin(name: &str) -> OpResult<&'static CoinSpec> {
    ALL_COINS
        .iter()
        .find(|c| c.matches(name))
        .copied()
        .ok_or_else(|| {
            OpError::new(OpErrorKind::Configuration)
                .join_msg(&format!("unsupported coin {:?}", name))
        })
}
