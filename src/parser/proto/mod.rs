//!
//! ## Data Types
//!
//! - `Tx`: a transaction as served by the node and stored by the backend,
//!   with inputs, outputs and cached addresses.
//! - `Block` / `BlockHeader`: a fully hydrated block.
//! - `BlockSummary`: the verbosity-1 view of a block, header plus txids.
//!

/// transactions, inputs and outputs
pub mod tx;

/// block header, hydrated block and block summary
pub mod block;
