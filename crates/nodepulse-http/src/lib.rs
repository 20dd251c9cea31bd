//! nodepulse-http: HTTP POST transport for NodePulse.
//!
//! ```rust,no_run
//! use nodepulse_core::RpcTransport;
//! use nodepulse_http::HttpRpcClient;
//!
//! # async fn run() -> Result<(), nodepulse_core::TransportError> {
//! let client = HttpRpcClient::default_for("http://127.0.0.1:8545")?;
//! let head = client.call("eth_blockNumber", vec![]).await?;
//! println!("head: {head}");
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
