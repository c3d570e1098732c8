//!
//! Adapter configuration, read from the JSON blob handed to the adapter
//! constructor.
//!
//! # Example
//!
//! ```json
//! {
//!     "coin_name": "Scrypta",
//!     "parallel_hydration": true,
//!     "hydration_threads": 4
//! }
//! ```
//!
use crate::coins::{find_coin, BlockFetch, CoinSpec};
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct AdapterConfig {
    pub coin_name: String,
    /// fetch the transactions of a block concurrently
    #[serde(default)]
    pub parallel_hydration: bool,
    /// worker count for concurrent fetches, `num_cpus::get()` when absent
    #[serde(default)]
    pub hydration_threads: Option<usize>,
    /// replaces the chain's own special transaction height
    #[serde(default)]
    pub special_tx_height: Option<u32>,
    #[serde(default)]
    pub supports_estimate_smart_fee: bool,
}

impl AdapterConfig {
    pub fn new(coin_name: &str) -> Self {
        AdapterConfig {
            coin_name: coin_name.to_string(),
            parallel_hydration: false,
            hydration_threads: None,
            special_tx_height: None,
            supports_estimate_smart_fee: false,
        }
    }

    pub fn from_json(raw: &str) -> OpResult<Self> {
        let config: AdapterConfig = serde_json::from_str(raw)
            .map_err(|e| OpError::new(OpErrorKind::Configuration).join_msg(&e.to_string()))?;
        if config.hydration_threads == Some(0) {
            return Err(OpError::new(OpErrorKind::Configuration)
                .join_msg("hydration_threads must be positive"));
        }
        Ok(config)
    }

    ///
    /// The capability table row named by `coin_name`.
    ///
    pub fn coin(&self) -> OpResult<&'static CoinSpec> {
        find_coin(&self.coin_name)
    }

    ///
    /// Block fetch policy of `coin` with the height override applied.
    ///
    /// Overriding the height of a chain that always fetches full blocks
    /// turns on the special transaction routing for it.
    ///
    pub fn block_fetch(&self, coin: &CoinSpec) -> BlockFetch {
        match self.special_tx_height {
            Some(special_tx_height) => BlockFetch::SpecialTxAware { special_tx_height },
            None => coin.block_fetch,
        }
    }

    pub fn hydration_threads(&self) -> usize {
        self.hydration_threads.unwrap_or_else(num_cpus::get)
    }
}
