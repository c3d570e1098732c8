use serde::{Deserialize, Serialize};

///
/// A transaction as the indexing backend sees it.
///
/// Field names follow the node's JSON (`getrawtransaction` verbose),
/// so RPC transports can deserialize responses straight into it.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct Tx {
    /// Raw consensus serialization, when the node supplied it.
    /// Not part of the packed format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
    pub txid: String,
    pub version: i32,
    #[serde(rename = "locktime")]
    pub lock_time: u32,
    pub vin: Vec<Vin>,
    pub vout: Vec<Vout>,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default)]
    pub time: i64,
    #[serde(default, rename = "blocktime")]
    pub block_time: i64,
}

///
/// An input: either a coinbase or a reference to a previous output.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct Vin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
    #[serde(default)]
    pub txid: String,
    #[serde(default)]
    pub vout: u32,
    #[serde(default, rename = "scriptSig")]
    pub script_sig: ScriptSig,
    pub sequence: u32,
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl Vin {
    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.coinbase.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct ScriptSig {
    #[serde(default)]
    pub hex: String,
}

///
/// An output.
///
/// `value_sat` is zero for outputs that carry no value: data carriers,
/// confidential outputs, fee outputs without an explicit amount.
///
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct Vout {
    #[serde(default, rename = "valueSat")]
    pub value_sat: u64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}
