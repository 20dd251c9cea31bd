//! Transport-level error types.

use thiserror::Error;

use crate::methods::ParamError;
use crate::request::{JsonRpcError, RpcId};

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, reset, or any other I/O failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// No response within the configured per-call timeout.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Body was not a well-formed JSON-RPC envelope.
    #[error("Malformed response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Envelope parsed but did not carry exactly one of `result` and `error`.
    #[error("Invalid response envelope: {0}")]
    InvalidEnvelope(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Response id does not belong to the request that was sent.
    #[error("Response id {actual} does not match request id {expected}")]
    IdMismatch { expected: RpcId, actual: RpcId },

    /// Circuit breaker is open for this endpoint.
    #[error("Circuit breaker open for endpoint: {endpoint}")]
    CircuitOpen { endpoint: String },

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Rejected before anything was sent.
    #[error("Invalid params: {0}")]
    InvalidParams(#[from] ParamError),
}

impl TransportError {
    /// Returns `true` for transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the node itself reported the failure.
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }

    /// Returns `true` if the response could not be correlated with its request.
    pub fn is_correlation_error(&self) -> bool {
        matches!(self, Self::IdMismatch { .. })
    }
}
