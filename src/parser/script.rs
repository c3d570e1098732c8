use crate::parser::chain_params::ChainParams;
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use bitcoin::blockdata::opcodes::{all, All};
use bitcoin::blockdata::script::{Builder, Instruction};
use bitcoin::util::base58;
use bitcoin::{PublicKey, Script};
use bitcoin_hashes::{hash160, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use Instruction::{Op, PushBytes};

///
/// Different types of output scripts.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScriptType {
    OpReturn,
    Pay2MultiSig,
    Pay2PublicKey,
    Pay2PublicKeyHash,
    Pay2ScriptHash,
    Pay2WitnessPublicKeyHash,
    Pay2WitnessScriptHash,
    WitnessProgram,
    Unspendable,
    NotRecognised,
}

///
/// Addresses derived from a script, encoded with the chain's version bytes.
///
/// `searchable` is true when the address alone identifies the script,
/// i.e. the script can be rebuilt from the address (P2PKH, P2SH).
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub addresses: Vec<String>,
    pub pattern: ScriptType,
    pub searchable: bool,
}

///
/// Extract addresses and script type from a script.
///
pub fn evaluate_script(script: &Script, params: &ChainParams) -> ScriptInfo {
    let bytes = script.as_bytes();
    if script.is_p2pk() {
        ScriptInfo::new(p2pk_to_address(script, params), ScriptType::Pay2PublicKey, false)
    } else if script.is_p2pkh() {
        let address = encode_address(&params.pub_key_hash_addr_id, &bytes[3..23]);
        ScriptInfo::new(Some(address), ScriptType::Pay2PublicKeyHash, true)
    } else if script.is_p2sh() {
        let address = encode_address(&params.script_hash_addr_id, &bytes[2..22]);
        ScriptInfo::new(Some(address), ScriptType::Pay2ScriptHash, true)
    } else if script.is_v0_p2wpkh() {
        ScriptInfo::new(None, ScriptType::Pay2WitnessPublicKeyHash, false)
    } else if script.is_v0_p2wsh() {
        ScriptInfo::new(None, ScriptType::Pay2WitnessScriptHash, false)
    } else if script.is_witness_program() {
        ScriptInfo::new(None, ScriptType::WitnessProgram, false)
    } else if script.is_op_return() {
        ScriptInfo::new(None, ScriptType::OpReturn, false)
    } else if script.is_provably_unspendable() {
        ScriptInfo::new(None, ScriptType::Unspendable, false)
    } else if is_multisig(script) {
        ScriptInfo::from_vec(
            multisig_addresses(script, params),
            ScriptType::Pay2MultiSig,
            false,
        )
    } else {
        ScriptInfo::new(None, ScriptType::NotRecognised, false)
    }
}

///
/// Rebuild the output script an address pays to.
///
/// Only base58 P2PKH and P2SH addresses of this chain are accepted.
///
pub fn address_to_script(address: &str, params: &ChainParams) -> OpResult<Script> {
    let payload = base58::from_check(address).map_err(|e| {
        OpError::new(OpErrorKind::InvalidAddress).join_msg(&format!("{}: {}", address, e))
    })?;
    let p2pkh = &params.pub_key_hash_addr_id;
    let p2sh = &params.script_hash_addr_id;
    if payload.len() == p2pkh.len() + 20 && payload.starts_with(p2pkh) {
        Ok(Builder::new()
            .push_opcode(all::OP_DUP)
            .push_opcode(all::OP_HASH160)
            .push_slice(&payload[p2pkh.len()..])
            .push_opcode(all::OP_EQUALVERIFY)
            .push_opcode(all::OP_CHECKSIG)
            .into_script())
    } else if payload.len() == p2sh.len() + 20 && payload.starts_with(p2sh) {
        Ok(Builder::new()
            .push_opcode(all::OP_HASH160)
            .push_slice(&payload[p2sh.len()..])
            .push_opcode(all::OP_EQUAL)
            .into_script())
    } else {
        Err(OpError::new(OpErrorKind::InvalidAddress).join_msg(&format!(
            "{}: version bytes do not belong to {}",
            address, params.name
        )))
    }
}

impl ScriptInfo {
    pub(crate) fn new(address: Option<String>, pattern: ScriptType, searchable: bool) -> Self {
        if let Some(address) = address {
            Self::from_vec(vec![address], pattern, searchable)
        } else {
            Self::from_vec(Vec::new(), pattern, searchable)
        }
    }

    pub(crate) fn from_vec(addresses: Vec<String>, pattern: ScriptType, searchable: bool) -> Self {
        Self {
            addresses,
            pattern,
            searchable,
        }
    }
}

#[inline]
fn encode_address(version: &[u8], hash: &[u8]) -> String {
    let mut payload = Vec::with_capacity(version.len() + hash.len());
    payload.extend_from_slice(version);
    payload.extend_from_slice(hash);
    base58::check_encode_slice(&payload)
}

#[inline]
fn pub_key_address(pk: &[u8], params: &ChainParams) -> String {
    let pkh = hash160::Hash::hash(pk);
    encode_address(&params.pub_key_hash_addr_id, &pkh.into_inner())
}

///
/// translated from Bitcoinj:
/// [isSentToMultisig()](https://github.com/bitcoinj/bitcoinj/blob/d3d5edbcbdb91b25de4df3b6ed6740d7e2329efc/core/src/main/java/org/bitcoinj/script/ScriptPattern.java#L225:L246)
fn is_multisig(script: &Script) -> bool {
    let mut chunks: Vec<Instruction> = Vec::new();
    for i in script.instructions() {
        if let Ok(i) = i {
            chunks.push(i);
        } else {
            return false;
        }
    }

    if chunks.len() < 4 {
        return false;
    }

    // Must end in OP_CHECKMULTISIG[VERIFY].
    match &chunks[chunks.len() - 1] {
        PushBytes(_) => return false,
        Op(op) => {
            if !(*op == all::OP_CHECKMULTISIG || *op == all::OP_CHECKMULTISIGVERIFY) {
                return false;
            }
        }
    }

    // Second to last chunk must be an OP_N opcode and there should be that many data chunks (keys).
    match get_num_keys(&chunks[chunks.len() - 2]) {
        Some(num_keys) if num_keys >= 1 && (num_keys + 3) as usize == chunks.len() => {}
        _ => return false,
    }

    // the rest must be data (except the first and the last 2)
    for chunk in chunks.iter().skip(1).take(chunks.len() - 3) {
        if let Op(_) = chunk {
            return false;
        }
    }

    // First chunk must be an OP_N opcode too.
    matches!(get_num_keys(&chunks[0]), Some(n) if n >= 1)
}

///
/// One P2PKH address per key of a bare multisig script.
/// Empty if any key is not a valid public key.
///
fn multisig_addresses(script: &Script, params: &ChainParams) -> Vec<String> {
    let ops: Vec<Instruction> = script.instructions().filter_map(|o| o.ok()).collect();
    let num_keys = match ops.get(ops.len().saturating_sub(2)) {
        Some(Op(op)) => decode_from_op_n(op),
        _ => return Vec::new(),
    };
    let mut addresses = Vec::with_capacity(num_keys.max(0) as usize);
    for op in ops.iter().skip(1).take(num_keys.max(0) as usize) {
        match op {
            PushBytes(data) if PublicKey::from_slice(data).is_ok() => {
                addresses.push(pub_key_address(data, params))
            }
            _ => return Vec::new(),
        }
    }
    addresses
}

///
/// translated from BitcoinJ:
/// [decodeFromOpN()](https://github.com/bitcoinj/bitcoinj/blob/d3d5edbcbdb91b25de4df3b6ed6740d7e2329efc/core/src/main/java/org/bitcoinj/script/Script.java#L515:L524)
///
#[inline]
fn decode_from_op_n(op: &All) -> i32 {
    if *op == all::OP_PUSHBYTES_0 {
        0
    } else if *op == all::OP_PUSHNUM_NEG1 {
        -1
    } else {
        op.into_u8() as i32 + 1 - all::OP_PUSHNUM_1.into_u8() as i32
    }
}

#[inline]
fn get_num_keys(op: &Instruction) -> Option<i32> {
    match op {
        PushBytes(_) => None,
        Op(op) => {
            let code = op.into_u8();
            if *op == all::OP_PUSHNUM_NEG1
                || *op == all::OP_PUSHBYTES_0
                || (code >= all::OP_PUSHNUM_1.into_u8() && code <= all::OP_PUSHNUM_16.into_u8())
            {
                Some(decode_from_op_n(op))
            } else {
                None
            }
        }
    }
}

///
/// P2PKH address of the key in a p2pk script.
///
#[inline]
fn p2pk_to_address(script: &Script, params: &ChainParams) -> Option<String> {
    match script.instructions().next() {
        Some(Ok(PushBytes(pk))) => Some(pub_key_address(pk, params)),
        _ => None,
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ScriptType::OpReturn => write!(f, "OpReturn"),
            ScriptType::Pay2MultiSig => write!(f, "Pay2MultiSig"),
            ScriptType::Pay2PublicKey => write!(f, "Pay2PublicKey"),
            ScriptType::Pay2PublicKeyHash => write!(f, "Pay2PublicKeyHash"),
            ScriptType::Pay2ScriptHash => write!(f, "Pay2ScriptHash"),
            ScriptType::Pay2WitnessPublicKeyHash => write!(f, "Pay2WitnessPublicKeyHash"),
            ScriptType::Pay2WitnessScriptHash => write!(f, "Pay2WitnessScriptHash"),
            ScriptType::WitnessProgram => write!(f, "WitnessProgram"),
            ScriptType::Unspendable => write!(f, "Unspendable"),
            ScriptType::NotRecognised => write!(f, "NotRecognised"),
        }
    }
}
