//! Command-line and environment configuration.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use nodepulse_core::methods::{validate_address, validate_tx_hash};
use nodepulse_core::policy::{CircuitBreakerConfig, RetryConfig};
use nodepulse_core::{BlockRef, ParamError};
use nodepulse_http::HttpClientConfig;
use nodepulse_metrics::{AccountTarget, PollerConfig, WatchTargets};

use crate::logging::LogConfig;

#[derive(Parser, Debug)]
#[command(
    name = "nodepulse",
    about = "Poll a blockchain node over JSON-RPC and log its operational metrics",
    long_about = "
NodePulse polls one node on a fixed interval and reports block time,
transaction throughput, transaction pool status, and optionally a
transaction receipt and an address transaction count.

ENVIRONMENT VARIABLES:
  NODEPULSE_RPC_URL        JSON-RPC endpoint (default http://127.0.0.1:8545)
  NODEPULSE_RECEIPT_HASH   Transaction hash to watch
  NODEPULSE_ADDRESS        Address whose transaction count is watched
  NODEPULSE_LOG            Log level
",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub node: NodeArgs,

    #[command(flatten)]
    pub log: LogArgs,

    /// Defaults to `watch`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll forever (or for --rounds rounds), logging every metric
    Watch {
        /// Stop after this many rounds
        #[arg(long)]
        rounds: Option<u64>,
    },
    /// Run a single round and print it
    Once {
        /// Print the round as JSON instead of log lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// JSON-RPC endpoint URL
    #[arg(long, env = "NODEPULSE_RPC_URL", default_value = "http://127.0.0.1:8545", global = true)]
    pub url: String,

    /// Seconds between polling rounds
    #[arg(long, env = "NODEPULSE_INTERVAL_SECS", default_value_t = 10, global = true)]
    pub interval_secs: u64,

    /// Per-call timeout in milliseconds
    #[arg(long, env = "NODEPULSE_TIMEOUT_MS", default_value_t = 5000, global = true)]
    pub timeout_ms: u64,

    /// Retries for transient transport failures
    #[arg(long, env = "NODEPULSE_MAX_RETRIES", default_value_t = 2, global = true)]
    pub max_retries: u32,

    /// Transaction hash whose receipt is reported each round
    #[arg(long, env = "NODEPULSE_RECEIPT_HASH", value_parser = parse_tx_hash, global = true)]
    pub receipt: Option<String>,

    /// Address whose transaction count is reported each round
    #[arg(long, env = "NODEPULSE_ADDRESS", value_parser = parse_address, global = true)]
    pub address: Option<String>,

    /// Block for the address count: latest, earliest, pending, 0x… or decimal
    #[arg(long, env = "NODEPULSE_BLOCK", default_value = "latest", global = true)]
    pub block: BlockRef,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Global log level
    #[arg(long, env = "NODEPULSE_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Per-crate level override, e.g. nodepulse-http=debug (repeatable)
    #[arg(long = "log-component", value_name = "CRATE=LEVEL", global = true)]
    pub log_components: Vec<String>,

    /// Emit JSON log lines
    #[arg(long, env = "NODEPULSE_LOG_JSON", global = true)]
    pub log_json: bool,
}

fn parse_tx_hash(s: &str) -> Result<String, ParamError> {
    validate_tx_hash(s)?;
    Ok(s.to_string())
}

fn parse_address(s: &str) -> Result<String, ParamError> {
    validate_address(s)?;
    Ok(s.to_string())
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch { rounds: None })
    }
}

impl NodeArgs {
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            retry: RetryConfig {
                max_retries: self.max_retries,
                ..RetryConfig::default()
            },
            circuit_breaker: CircuitBreakerConfig::default(),
            request_timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn targets(&self) -> WatchTargets {
        WatchTargets {
            receipt: self.receipt.clone(),
            account: self.address.clone().map(|address| AccountTarget {
                address,
                block: self.block.clone(),
            }),
        }
    }

    pub fn poller_config(&self, max_rounds: Option<u64>) -> Result<PollerConfig> {
        if self.interval_secs == 0 {
            bail!("--interval-secs must be at least 1");
        }
        Ok(PollerConfig {
            interval: Duration::from_secs(self.interval_secs),
            max_rounds,
            targets: self.targets(),
        })
    }
}

impl LogArgs {
    pub fn log_config(&self) -> Result<LogConfig> {
        let mut components = HashMap::new();
        for entry in &self.log_components {
            let Some((component, level)) = entry.split_once('=') else {
                bail!("invalid --log-component '{entry}': expected CRATE=LEVEL");
            };
            components.insert(component.to_string(), level.to_string());
        }
        Ok(LogConfig {
            level: self.log_level.clone(),
            components,
            json: self.log_json,
        })
    }
}
