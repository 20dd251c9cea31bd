//! nodepulse-core: wire types and transport contract for NodePulse.
//!
//! # Overview
//!
//! NodePulse polls a single blockchain node over JSON-RPC and turns its
//! answers into operational metrics. This crate defines:
//!
//! - [`RpcTransport`]: the async trait every node connection implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`RpcCall`] / [`BlockRef`]: validated builders for the consumed methods
//! - [`TransportError`]: transport, protocol and node error taxonomy
//! - [`policy`] module: retry with backoff, circuit breaker

pub mod error;
pub mod methods;
pub mod policy;
pub mod request;
pub mod transport;

pub use error::TransportError;
pub use methods::{BlockRef, ParamError, RpcCall};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::{HealthStatus, RpcTransport};
