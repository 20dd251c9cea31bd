//! nodepulse CLI: poll a node and log its operational metrics.
//!
//! Usage:
//! ```bash
//! # Poll every 10s until Ctrl-C
//! nodepulse watch --url http://127.0.0.1:8545
//!
//! # Also follow a receipt and an address nonce
//! nodepulse watch --receipt 0x4cd2…90c7 --address 0xef11…64Ca --block latest
//!
//! # One round, machine-readable
//! nodepulse once --json
//! ```

mod config;
mod logging;

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use nodepulse_http::HttpRpcClient;
use nodepulse_metrics::{NodeMetrics, Poller};

use config::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    logging::init_tracing(&cli.log.log_config()?);

    let client = HttpRpcClient::new(&cli.node.url, cli.node.http_config())
        .with_context(|| format!("cannot use endpoint {}", cli.node.url))?;
    let metrics = NodeMetrics::new(Arc::new(client));

    match cli.command() {
        Command::Watch { rounds } => cmd_watch(&cli, metrics, rounds).await,
        Command::Once { json } => cmd_once(&cli, metrics, json).await,
    }
}

async fn cmd_watch(cli: &Cli, metrics: NodeMetrics, rounds: Option<u64>) -> Result<i32> {
    let config = cli.node.poller_config(rounds)?;
    tracing::info!(
        url = %metrics.transport().url(),
        interval_secs = config.interval.as_secs(),
        receipt = config.targets.receipt.as_deref(),
        address = config.targets.account.as_ref().map(|a| a.address.as_str()),
        "starting node monitor"
    );

    let poller = Poller::new(metrics, config);
    let completed = poller.run_until(shutdown_signal(), |report| report.log()).await;

    tracing::info!(rounds = completed, "node monitor stopped");
    Ok(0)
}

/// Exits with status 2 when any metric failed, so scripts can alert on it.
async fn cmd_once(cli: &Cli, metrics: NodeMetrics, json: bool) -> Result<i32> {
    let report = metrics.collect_round(1, &cli.node.targets()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else {
        report.log();
    }

    tracing::debug!(health = %metrics.transport().health(), "endpoint health");
    Ok(if report.is_clean() { 0 } else { 2 })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; stop the process to exit");
        std::future::pending::<()>().await;
    }
}
