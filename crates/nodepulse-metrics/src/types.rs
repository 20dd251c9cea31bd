//! Metric values produced by the extractors.

use std::fmt;

use serde::{Deserialize, Serialize};

use nodepulse_core::methods::is_hex_quantity;

/// Block timestamp exactly as the node reported it (usually hex seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockTimestamp(String);

impl BlockTimestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Seconds since the epoch, if the raw value is a hex quantity.
    pub fn seconds(&self) -> Option<u64> {
        HexQuantity::parse(&self.0).map(|q| q.value())
    }
}

impl fmt::Display for BlockTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node quantity: the raw `0x…` string and its decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexQuantity {
    raw: String,
    value: u64,
}

impl HexQuantity {
    /// `None` unless `raw` is `0x` followed by hex digits that fit in a `u64`.
    pub fn parse(raw: &str) -> Option<Self> {
        if !is_hex_quantity(raw) {
            return None;
        }
        let value = u64::from_str_radix(&raw[2..], 16).ok()?;
        Some(Self {
            raw: raw.to_string(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl fmt::Display for HexQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.raw)
    }
}

/// Transaction pool occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPoolStatus {
    /// Executable transactions.
    pub pending: HexQuantity,
    /// Transactions waiting on a nonce gap or similar.
    pub queued: HexQuantity,
}

impl TransactionPoolStatus {
    pub fn total(&self) -> u64 {
        self.pending.value().saturating_add(self.queued.value())
    }
}

/// The parts of a transaction receipt NodePulse reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub hash: String,
    pub sender: String,
    /// `None` for contract creations.
    pub recipient: Option<String>,
    /// `0x1` success, `0x0` failure; absent on pre-Byzantium receipts.
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> Option<bool> {
        match self.status.as_deref() {
            Some("0x1") => Some(true),
            Some("0x0") => Some(false),
            _ => None,
        }
    }
}
