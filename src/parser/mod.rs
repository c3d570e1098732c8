//!
//! This module defines how node data is represented, packed for storage
//! and interpreted with a chain's parameters.
//!

/// network parameters and the process-wide registry
pub mod chain_params;

/// compact storage format of transactions
pub mod pack;

/// variable-length integer readers and writers
pub mod reader;

/// add multi-sig pattern recognition and decode addresses from scripts
pub mod script;

/// blocks and transactions as returned by the node
pub mod proto;

/// error handling
pub mod errors;
