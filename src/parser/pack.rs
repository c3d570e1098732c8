//!
//! Packed transaction storage format.
//!
//! ```text
//! u8       format tag (PACKED_TX_FORMAT or PACKED_TX_FORMAT_RAW)
//! varint   block height
//! zigzag   block time
//! bytes    txid
//! bytes    raw transaction             (PACKED_TX_FORMAT_RAW only)
//! zigzag   version
//! varint   lock time
//! varint   input count, then per input:
//!   u8       flags (bit 0: coinbase)
//!   bytes    coinbase payload          (coinbase only)
//!   bytes    previous txid             (otherwise)
//!   varint   previous vout             (otherwise)
//!   bytes    script sig
//!   varint   sequence
//!   strings  cached addresses
//! varint   output count, then per output:
//!   varint   value in satoshi
//!   varint   n
//!   bytes    script pub key
//!   strings  cached addresses
//! ```
//!
//! `bytes` and `strings` are varint length-prefixed. Hex fields of `Tx`
//! are stored as raw bytes and must be lowercase, so that decoding gives
//! back the same strings. The layout is an on-disk contract: a change
//! must come with a new format tag.
//!
use crate::parser::errors::{OpError, OpErrorKind, OpResult};
use crate::parser::proto::tx::{ScriptPubKey, ScriptSig, Tx, Vin, Vout};
use crate::parser::reader::{PackedRead, PackedWrite};
use bitcoin_hashes::hex::{FromHex, ToHex};
use std::io::Cursor;

pub const PACKED_TX_FORMAT: u8 = 0x01;
/// same as `PACKED_TX_FORMAT` with the raw transaction after the txid
pub const PACKED_TX_FORMAT_RAW: u8 = 0x02;

const VIN_FLAG_COINBASE: u8 = 0x01;

/// smallest possible encoding of one input / output, bounds pre-allocation
const MIN_VIN_LEN: u64 = 5;
const MIN_VOUT_LEN: u64 = 4;

///
/// Encode `tx` for storage together with the height and time of its block.
///
/// The raw transaction is kept when `tx.hex` is set.
///
/// Fails with `Encode` if a hex field is not lowercase hex or the outputs
/// are not indexed densely from zero.
///
pub fn pack_tx(tx: &Tx, height: u32, block_time: i64) -> OpResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(estimate_len(tx));
    let format = match tx.hex {
        Some(_) => PACKED_TX_FORMAT_RAW,
        None => PACKED_TX_FORMAT,
    };
    buf.write_u8(format)?;
    buf.write_varint(height as u64)?;
    buf.write_varint_i64(block_time)?;
    buf.write_var_bytes(&hex_field(&tx.txid, "txid")?)?;
    if let Some(raw) = &tx.hex {
        buf.write_var_bytes(&hex_field(raw, "hex")?)?;
    }
    buf.write_varint_i64(tx.version as i64)?;
    buf.write_varint(tx.lock_time as u64)?;

    buf.write_varint(tx.vin.len() as u64)?;
    for vin in &tx.vin {
        match &vin.coinbase {
            Some(coinbase) => {
                buf.write_u8(VIN_FLAG_COINBASE)?;
                buf.write_var_bytes(&hex_field(coinbase, "vin.coinbase")?)?;
            }
            None => {
                buf.write_u8(0)?;
                buf.write_var_bytes(&hex_field(&vin.txid, "vin.txid")?)?;
                buf.write_varint(vin.vout as u64)?;
            }
        }
        buf.write_var_bytes(&hex_field(&vin.script_sig.hex, "vin.script_sig")?)?;
        buf.write_varint(vin.sequence as u64)?;
        write_strings(&mut buf, &vin.addresses)?;
    }

    buf.write_varint(tx.vout.len() as u64)?;
    for (i, vout) in tx.vout.iter().enumerate() {
        if vout.n as usize != i {
            return Err(OpError::new(OpErrorKind::Encode).join_msg(&format!(
                "output at position {} has index {}, txid {}",
                i, vout.n, tx.txid
            )));
        }
        buf.write_varint(vout.value_sat)?;
        buf.write_varint(vout.n as u64)?;
        buf.write_var_bytes(&hex_field(&vout.script_pub_key.hex, "vout.script_pub_key")?)?;
        write_strings(&mut buf, &vout.script_pub_key.addresses)?;
    }
    Ok(buf)
}

///
/// Decode a packed transaction, returning it with its block height.
///
/// Never panics on malformed input; every failure is a `Decode` error
/// naming the offset and field that could not be read.
///
pub fn unpack_tx(buf: &[u8]) -> OpResult<(Tx, u32)> {
    let mut r = Unpacker::new(buf);
    let format = r.u8("format")?;
    if format != PACKED_TX_FORMAT && format != PACKED_TX_FORMAT_RAW {
        return Err(OpError::decode(0, "format")
            .join_msg(&format!("unknown packed tx format {}", format)));
    }
    let height = r.u32("height")?;
    let block_time = r.i64("block_time")?;
    let txid = r.hex("txid")?;
    let hex = if format == PACKED_TX_FORMAT_RAW {
        Some(r.hex("hex")?)
    } else {
        None
    };
    let version = r.i32("version")?;
    let lock_time = r.u32("lock_time")?;

    let vin_count = r.count("vin.count", MIN_VIN_LEN)?;
    let mut vin = Vec::with_capacity(vin_count);
    for _ in 0..vin_count {
        let flags = r.u8("vin.flags")?;
        let (coinbase, prev_txid, prev_vout) = if flags & VIN_FLAG_COINBASE > 0 {
            (Some(r.hex("vin.coinbase")?), String::new(), 0)
        } else {
            (None, r.hex("vin.txid")?, r.u32("vin.vout")?)
        };
        vin.push(Vin {
            coinbase,
            txid: prev_txid,
            vout: prev_vout,
            script_sig: ScriptSig {
                hex: r.hex("vin.script_sig")?,
            },
            sequence: r.u32("vin.sequence")?,
            addresses: r.strings("vin.addresses")?,
        });
    }

    let vout_count = r.count("vout.count", MIN_VOUT_LEN)?;
    let mut vout = Vec::with_capacity(vout_count);
    for i in 0..vout_count {
        let value_sat = r.u64("vout.value")?;
        let offset = r.offset();
        let n = r.u32("vout.n")?;
        if n as usize != i {
            return Err(OpError::decode(offset, "vout.n")
                .join_msg(&format!("output at position {} has index {}", i, n)));
        }
        vout.push(Vout {
            value_sat,
            n,
            script_pub_key: ScriptPubKey {
                hex: r.hex("vout.script_pub_key")?,
                addresses: r.strings("vout.addresses")?,
            },
        });
    }

    if r.remaining() > 0 {
        return Err(OpError::decode(r.offset(), "trailing")
            .join_msg(&format!("{} unexpected bytes", r.remaining())));
    }

    let tx = Tx {
        hex,
        txid,
        version,
        lock_time,
        vin,
        vout,
        confirmations: 0,
        time: block_time,
        block_time,
    };
    Ok((tx, height))
}

#[inline]
fn hex_field(hex: &str, field: &str) -> OpResult<Vec<u8>> {
    if hex.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(OpError::new(OpErrorKind::Encode)
            .join_msg(&format!("{}: hex must be lowercase", field)));
    }
    Vec::<u8>::from_hex(hex).map_err(|e| {
        OpError::new(OpErrorKind::Encode).join_msg(&format!("{}: {}", field, e))
    })
}

fn write_strings(buf: &mut Vec<u8>, strings: &[String]) -> OpResult<()> {
    buf.write_varint(strings.len() as u64)?;
    for s in strings {
        buf.write_var_bytes(s.as_bytes())?;
    }
    Ok(())
}

fn estimate_len(tx: &Tx) -> usize {
    let scripts: usize = tx
        .vin
        .iter()
        .map(|v| v.script_sig.hex.len() / 2 + 48)
        .chain(tx.vout.iter().map(|v| v.script_pub_key.hex.len() / 2 + 48))
        .sum();
    32 + scripts
}

#[inline]
fn decode_failure(offset: u64, field: &'static str, e: OpError) -> OpError {
    OpError::decode(offset, field).join_msg(&e.to_string())
}

///
/// Cursor over packed bytes that turns every read failure
/// into a `Decode` error at the offset where the field starts.
///
struct Unpacker<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Unpacker<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Unpacker {
            cursor: Cursor::new(buf),
        }
    }

    #[inline]
    fn offset(&self) -> u64 {
        self.cursor.position()
    }

    #[inline]
    fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    fn u8(&mut self, field: &'static str) -> OpResult<u8> {
        let offset = self.offset();
        self.cursor
            .read_u8()
            .map_err(|e| decode_failure(offset, field, e))
    }

    fn u64(&mut self, field: &'static str) -> OpResult<u64> {
        let offset = self.offset();
        self.cursor
            .read_varint()
            .map_err(|e| decode_failure(offset, field, e))
    }

    fn u32(&mut self, field: &'static str) -> OpResult<u32> {
        let offset = self.offset();
        let n = self.u64(field)?;
        if n > u32::MAX as u64 {
            return Err(OpError::decode(offset, field).join_msg("value exceeds 32 bits"));
        }
        Ok(n as u32)
    }

    fn i64(&mut self, field: &'static str) -> OpResult<i64> {
        let offset = self.offset();
        self.cursor
            .read_varint_i64()
            .map_err(|e| decode_failure(offset, field, e))
    }

    fn i32(&mut self, field: &'static str) -> OpResult<i32> {
        let offset = self.offset();
        let n = self.i64(field)?;
        if n < i32::MIN as i64 || n > i32::MAX as i64 {
            return Err(OpError::decode(offset, field).join_msg("value exceeds 32 bits"));
        }
        Ok(n as i32)
    }

    ///
    /// Element count, rejected up front if the remaining bytes cannot
    /// possibly hold that many elements.
    ///
    fn count(&mut self, field: &'static str, min_element_len: u64) -> OpResult<usize> {
        let offset = self.offset();
        let n = self.u64(field)?;
        if n.saturating_mul(min_element_len) > self.remaining() {
            return Err(OpError::decode(offset, field)
                .join_msg(&format!("count {} exceeds remaining bytes", n)));
        }
        Ok(n as usize)
    }

    fn bytes(&mut self, field: &'static str) -> OpResult<Vec<u8>> {
        let offset = self.offset();
        let len = self.u64(field)?;
        if len > self.remaining() {
            return Err(OpError::decode(offset, field)
                .join_msg(&format!("length {} exceeds remaining bytes", len)));
        }
        self.cursor
            .read_u8_vec(len as usize)
            .map_err(|e| decode_failure(offset, field, e))
    }

    #[inline]
    fn hex(&mut self, field: &'static str) -> OpResult<String> {
        Ok(self.bytes(field)?.to_hex())
    }

    fn string(&mut self, field: &'static str) -> OpResult<String> {
        let offset = self.offset();
        let bytes = self.bytes(field)?;
        String::from_utf8(bytes)
            .map_err(|_| OpError::decode(offset, field).join_msg("invalid utf-8"))
    }

    fn strings(&mut self, field: &'static str) -> OpResult<Vec<String>> {
        let n = self.count(field, 1)?;
        let mut strings = Vec::with_capacity(n);
        for _ in 0..n {
            strings.push(self.string(field)?);
        }
        Ok(strings)
    }
}
