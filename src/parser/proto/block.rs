use crate::parser::proto::tx::Tx;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct BlockHeader {
    pub hash: String,
    #[serde(default, rename = "previousblockhash")]
    pub prev: String,
    #[serde(default, rename = "nextblockhash")]
    pub next: String,
    pub height: u32,
    #[serde(default)]
    pub confirmations: i32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub time: i64,
}

///
/// A block with fully hydrated transactions, in block order.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Tx>,
}

///
/// Verbosity-1 view of a block: header fields and the txid list only.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct BlockSummary {
    #[serde(flatten)]
    pub header: BlockHeader,
    #[serde(rename = "tx")]
    pub txids: Vec<String>,
}
