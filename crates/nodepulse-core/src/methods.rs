//! Typed builders for the RPC methods NodePulse consumes.
//!
//! Every outbound call goes through [`RpcCall`], so arity and argument
//! formats are checked before anything is serialized onto the wire.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};
use thiserror::Error;

/// A parameter rejected before the request was built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("invalid transaction hash '{0}': expected 0x followed by 64 hex digits")]
    TxHash(String),

    #[error("invalid address '{0}': expected 0x followed by 40 hex digits")]
    Address(String),

    #[error("invalid block reference '{0}': expected latest, earliest, pending, a hex quantity or a decimal number")]
    BlockRef(String),
}

/// A block reference: a tag or a concrete block number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlockRef {
    #[default]
    Latest,
    Earliest,
    Pending,
    /// Hex quantity as the node expects it on the wire (`0x…`).
    Number(String),
}

impl BlockRef {
    /// Wrap a block number exactly as the node reported it.
    pub fn from_quantity(quantity: &str) -> Result<Self, ParamError> {
        if is_hex_quantity(quantity) {
            Ok(Self::Number(quantity.to_string()))
        } else {
            Err(ParamError::BlockRef(quantity.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Latest => "latest",
            Self::Earliest => "earliest",
            Self::Pending => "pending",
            Self::Number(n) => n,
        }
    }
}

impl FromStr for BlockRef {
    type Err = ParamError;

    /// Accepts tags, `0x` quantities, and decimal numbers (re-encoded as hex).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "earliest" => Ok(Self::Earliest),
            "pending" => Ok(Self::Pending),
            _ if s.starts_with("0x") => Self::from_quantity(s),
            _ => s
                .parse::<u64>()
                .map(|n| Self::Number(format!("{n:#x}")))
                .map_err(|_| ParamError::BlockRef(s.to_string())),
        }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the RPC calls issued by the metric extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCall {
    /// `eth_blockNumber()`
    BlockNumber,
    /// `eth_getBlockByNumber(block, full_transactions)`
    BlockByNumber {
        block: BlockRef,
        full_transactions: bool,
    },
    /// `txpool_status()`
    TxPoolStatus,
    /// `eth_getTransactionReceipt(hash)`
    TransactionReceipt { hash: String },
    /// `eth_getTransactionCount(address, block)`
    TransactionCount { address: String, block: BlockRef },
}

impl RpcCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::BlockNumber => "eth_blockNumber",
            Self::BlockByNumber { .. } => "eth_getBlockByNumber",
            Self::TxPoolStatus => "txpool_status",
            Self::TransactionReceipt { .. } => "eth_getTransactionReceipt",
            Self::TransactionCount { .. } => "eth_getTransactionCount",
        }
    }

    /// Validate and build the positional parameter list.
    pub fn params(&self) -> Result<Vec<Value>, ParamError> {
        match self {
            Self::BlockNumber | Self::TxPoolStatus => Ok(vec![]),
            Self::BlockByNumber {
                block,
                full_transactions,
            } => {
                validate_block(block)?;
                Ok(vec![json!(block.as_str()), json!(full_transactions)])
            }
            Self::TransactionReceipt { hash } => {
                validate_tx_hash(hash)?;
                Ok(vec![json!(hash)])
            }
            Self::TransactionCount { address, block } => {
                validate_address(address)?;
                validate_block(block)?;
                Ok(vec![json!(address), json!(block.as_str())])
            }
        }
    }
}

pub fn validate_tx_hash(hash: &str) -> Result<(), ParamError> {
    if is_hex_bytes(hash, 32) {
        Ok(())
    } else {
        Err(ParamError::TxHash(hash.to_string()))
    }
}

pub fn validate_address(address: &str) -> Result<(), ParamError> {
    if is_hex_bytes(address, 20) {
        Ok(())
    } else {
        Err(ParamError::Address(address.to_string()))
    }
}

fn validate_block(block: &BlockRef) -> Result<(), ParamError> {
    match block {
        BlockRef::Number(n) if !is_hex_quantity(n) => Err(ParamError::BlockRef(n.clone())),
        _ => Ok(()),
    }
}

/// `0x` followed by exactly `len` bytes of hex.
fn is_hex_bytes(s: &str, len: usize) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|h| h.len() == len * 2 && h.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// `0x` followed by at least one hex digit.
pub fn is_hex_quantity(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|h| !h.is_empty() && h.bytes().all(|b| b.is_ascii_hexdigit()))
}
