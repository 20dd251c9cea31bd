//! The polling loop: a round, then a pause, until shutdown.

use std::future::Future;
use std::time::Duration;

use crate::extract::NodeMetrics;
use crate::round::{RoundReport, WatchTargets};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Pause between the end of one round and the start of the next.
    pub interval: Duration,
    /// Stop after this many rounds; `None` polls until shutdown.
    pub max_rounds: Option<u64>,
    pub targets: WatchTargets,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_rounds: None,
            targets: WatchTargets::default(),
        }
    }
}

/// Drives [`NodeMetrics::collect_round`] on a fixed interval.
pub struct Poller {
    metrics: NodeMetrics,
    config: PollerConfig,
}

impl Poller {
    pub fn new(metrics: NodeMetrics, config: PollerConfig) -> Self {
        Self { metrics, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll until `shutdown` resolves or `max_rounds` is reached, handing every
    /// finished round to `on_report`. Returns the number of completed rounds.
    ///
    /// Shutdown during a round abandons its in-flight calls; that round is not
    /// reported. Extractor failures never end the loop.
    pub async fn run_until<F, R>(&self, shutdown: F, mut on_report: R) -> u64
    where
        F: Future<Output = ()>,
        R: FnMut(&RoundReport),
    {
        tokio::pin!(shutdown);
        let mut completed = 0u64;

        while !self.done(completed) {
            let round = completed + 1;
            let report = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!(round, "shutdown requested, abandoning round");
                    break;
                }
                report = self.metrics.collect_round(round, &self.config.targets) => report,
            };

            on_report(&report);
            completed = round;
            if self.done(completed) {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!(rounds = completed, "shutdown requested");
                    break;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        completed
    }

    fn done(&self, completed: u64) -> bool {
        self.config.max_rounds.is_some_and(|max| completed >= max)
    }
}
