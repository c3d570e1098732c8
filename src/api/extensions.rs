//!
//! Chain-specific RPC calls, gated by the coin's capabilities.
//!
use super::CoinAdapter;
use crate::coins::Capability;
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use crate::rpc::ChainRpc;
use serde_json::Value;

impl<R: ChainRpc> CoinAdapter<R> {
    ///
    /// Raw `masternodelist` payload of the node.
    ///
    /// String results are returned as they are, anything else as its JSON
    /// text. Chains without masternodes fail with `Unsupported` and never
    /// reach the node.
    ///
    pub fn masternode_list(&self) -> OpResult<String> {
        self.require(Capability::MasternodeList)?;
        match self.rpc.call("masternodelist", &[])? {
            Value::String(list) => Ok(list),
            other => Ok(other.to_string()),
        }
    }

    fn require(&self, capability: Capability) -> OpResult<()> {
        if self.coin.has_capability(capability) {
            Ok(())
        } else {
            Err(OpError::new(OpErrorKind::Unsupported)
                .join_msg(&format!("{:?} on {}", capability, self.coin.name)))
        }
    }
}
