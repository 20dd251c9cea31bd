//! nodepulse-metrics: operational metrics of a blockchain node.
//!
//! # Extractors
//! | Metric | RPC calls |
//! |--------|-----------|
//! | block time | `eth_blockNumber` → `eth_getBlockByNumber(n, false)` |
//! | transaction throughput | `eth_blockNumber` → `eth_getBlockByNumber(n, true)` |
//! | pool status | `txpool_status` |
//! | transaction receipt | `eth_getTransactionReceipt(hash)` |
//! | address transaction count | `eth_getTransactionCount(address, block)` |
//!
//! [`NodeMetrics::collect_round`] runs them concurrently and [`Poller`]
//! repeats rounds on an interval.

pub mod error;
pub mod extract;
pub mod poller;
pub mod round;
pub mod types;

#[cfg(test)]
mod mock;

pub use error::MetricError;
pub use extract::NodeMetrics;
pub use poller::{Poller, PollerConfig};
pub use round::{AccountTarget, Outcome, RoundReport, WatchTargets};
pub use types::{BlockTimestamp, HexQuantity, TransactionPoolStatus, TransactionReceipt};
