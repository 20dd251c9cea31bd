//! One polling round: every configured extractor, run concurrently.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};

use nodepulse_core::BlockRef;

use crate::error::MetricError;
use crate::extract::NodeMetrics;
use crate::types::{BlockTimestamp, TransactionPoolStatus, TransactionReceipt};

/// Result of a single extractor within a round.
pub type Outcome<T> = Result<T, MetricError>;

/// Address whose transaction count is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTarget {
    pub address: String,
    pub block: BlockRef,
}

/// Optional per-transaction / per-account metrics to collect each round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchTargets {
    pub receipt: Option<String>,
    pub account: Option<AccountTarget>,
}

/// Per-extractor outcomes of one round.
#[derive(Debug)]
pub struct RoundReport {
    pub round: u64,
    pub elapsed: Duration,
    pub block_time: Outcome<BlockTimestamp>,
    pub throughput: Outcome<usize>,
    pub pool_status: Outcome<TransactionPoolStatus>,
    /// `None` when no receipt is watched.
    pub receipt: Option<Outcome<TransactionReceipt>>,
    /// `None` when no account is watched.
    pub transaction_count: Option<Outcome<String>>,
}

impl NodeMetrics {
    /// Run every configured extractor concurrently and collect all outcomes.
    ///
    /// A failing extractor never cancels the others.
    pub async fn collect_round(&self, round: u64, targets: &WatchTargets) -> RoundReport {
        let started = Instant::now();

        let receipt = async {
            match &targets.receipt {
                Some(hash) => Some(self.transaction_receipt(hash).await),
                None => None,
            }
        };
        let transaction_count = async {
            match &targets.account {
                Some(a) => Some(self.transaction_count(&a.address, &a.block).await),
                None => None,
            }
        };

        let (block_time, throughput, pool_status, receipt, transaction_count) = tokio::join!(
            self.block_time(),
            self.transaction_throughput(),
            self.pool_status(),
            receipt,
            transaction_count,
        );

        RoundReport {
            round,
            elapsed: started.elapsed(),
            block_time,
            throughput,
            pool_status,
            receipt,
            transaction_count,
        }
    }
}

impl RoundReport {
    /// Number of extractors that failed this round.
    pub fn failures(&self) -> usize {
        [
            self.block_time.is_err(),
            self.throughput.is_err(),
            self.pool_status.is_err(),
            self.receipt.as_ref().is_some_and(Result::is_err),
            self.transaction_count.as_ref().is_some_and(Result::is_err),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures() == 0
    }

    /// Emit one structured event per metric: `info` on success, `warn` on failure.
    pub fn log(&self) {
        let round = self.round;

        match &self.block_time {
            Ok(ts) => tracing::info!(round, timestamp = %ts, seconds = ts.seconds(), "block time"),
            Err(e) => tracing::warn!(round, error = %e, "block time unavailable"),
        }
        match &self.throughput {
            Ok(n) => tracing::info!(round, transactions = n, "transaction throughput"),
            Err(e) => tracing::warn!(round, error = %e, "transaction throughput unavailable"),
        }
        match &self.pool_status {
            Ok(p) => tracing::info!(
                round,
                pending = p.pending.value(),
                queued = p.queued.value(),
                "transaction pool status"
            ),
            Err(e) => tracing::warn!(round, error = %e, "transaction pool status unavailable"),
        }
        match &self.receipt {
            Some(Ok(r)) => tracing::info!(
                round,
                hash = %r.hash,
                sender = %r.sender,
                recipient = r.recipient.as_deref().unwrap_or("<contract creation>"),
                status = r.status.as_deref().unwrap_or("<none>"),
                "transaction receipt"
            ),
            Some(Err(e)) if e.is_not_found() => tracing::info!(round, "{e}"),
            Some(Err(e)) => tracing::warn!(round, error = %e, "transaction receipt unavailable"),
            None => {}
        }
        match &self.transaction_count {
            Some(Ok(count)) => tracing::info!(round, count = %count, "address transaction count"),
            Some(Err(e)) => tracing::warn!(round, error = %e, "address transaction count unavailable"),
            None => {}
        }

        tracing::debug!(
            round,
            elapsed_ms = self.elapsed.as_millis() as u64,
            failures = self.failures(),
            "round complete"
        );
    }

    /// Render the round as JSON: `{"ok": …}` or `{"error": …}` per metric.
    pub fn to_json(&self) -> Value {
        let mut out = json!({
            "round": self.round,
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "block_time": outcome_json(&self.block_time),
            "throughput": outcome_json(&self.throughput),
            "pool_status": outcome_json(&self.pool_status),
        });
        if let Some(r) = &self.receipt {
            out["receipt"] = outcome_json(r);
        }
        if let Some(c) = &self.transaction_count {
            out["transaction_count"] = outcome_json(c);
        }
        out
    }
}

fn outcome_json<T: Serialize>(outcome: &Outcome<T>) -> Value {
    match outcome {
        Ok(v) => json!({ "ok": v }),
        Err(e) if e.is_not_found() => json!({ "not_found": e.to_string() }),
        Err(e) => json!({ "error": e.to_string() }),
    }
}
