//! The `RpcTransport` trait: the contract every node connection implements.

use async_trait::async_trait;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::TransportError;
use crate::methods::RpcCall;
use crate::request::{JsonRpcRequest, JsonRpcResponse, RpcId};

/// Endpoint health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Endpoint is responding normally.
    Healthy,
    /// Endpoint is being probed after a run of failures.
    Degraded,
    /// Endpoint is failing fast (circuit open).
    Unhealthy,
    /// Not tracked by this transport.
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A point-to-point JSON-RPC channel to a single node.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; one transport is shared by every
/// extractor running in a round.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send one request envelope and return the response envelope as-is.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Return the current health status of this transport.
    fn health(&self) -> HealthStatus {
        HealthStatus::Unknown
    }

    /// Return the endpoint this transport talks to.
    fn url(&self) -> &str;

    /// Correlation id for the next request.
    ///
    /// Calls are never pipelined, so a constant id is enough for correctness.
    fn next_id(&self) -> u64 {
        1
    }

    /// Call `method` and return the `result` payload exactly as the node sent it.
    ///
    /// Fails with [`TransportError::Rpc`] when the node populated `error`,
    /// with [`TransportError::IdMismatch`] when the response id is not the one
    /// that was sent, and with [`TransportError::InvalidEnvelope`] when the
    /// response carries neither or both of `result` and `error`.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Box<RawValue>, TransportError> {
        let req = JsonRpcRequest::new(self.next_id(), method, params);
        let expected = req.id.clone();
        tracing::debug!(method, id = %expected, url = %self.url(), "sending request");

        let resp = self.send(req).await?;
        check_correlation(&expected, &resp)?;
        resp.into_result()
    }

    /// Validate a typed call and send it.
    async fn request(&self, call: &RpcCall) -> Result<Box<RawValue>, TransportError> {
        let params = call.params()?;
        self.call(call.method(), params).await
    }
}

/// A `null` id is accepted only on error responses: nodes answer requests they
/// could not parse that way.
fn check_correlation(expected: &RpcId, resp: &JsonRpcResponse) -> Result<(), TransportError> {
    if resp.id == *expected || (resp.id == RpcId::Null && resp.error.is_some()) {
        return Ok(());
    }
    tracing::warn!(expected = %expected, actual = %resp.id, "response id mismatch");
    Err(TransportError::IdMismatch {
        expected: expected.clone(),
        actual: resp.id.clone(),
    })
}
