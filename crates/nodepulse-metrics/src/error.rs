//! Error types for metric extraction.

use thiserror::Error;

use nodepulse_core::{JsonRpcError, TransportError};

/// Why a metric could not be produced.
///
/// Transport failures pass through untouched, tagged with the RPC method of
/// the call in the sequence that failed.
#[derive(Debug, Error)]
pub enum MetricError {
    #[error("{method} failed: {source}")]
    Call {
        method: &'static str,
        #[source]
        source: TransportError,
    },

    /// A result was present but did not have the expected shape.
    #[error("{method} returned an unexpected payload: {reason}")]
    Decode { method: &'static str, reason: String },

    /// The node answered with `null`: nothing exists for the query.
    #[error("{what} not found")]
    NotFound { what: String },
}

impl MetricError {
    pub(crate) fn decode(method: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            method,
            reason: reason.into(),
        }
    }

    /// RPC method of the failing call, when one is known.
    pub fn method(&self) -> Option<&'static str> {
        match self {
            Self::Call { method, .. } | Self::Decode { method, .. } => Some(*method),
            Self::NotFound { .. } => None,
        }
    }

    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Call { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The node-reported error object, if the node rejected the call.
    pub fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self.transport() {
            Some(TransportError::Rpc(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub fn is_correlation_error(&self) -> bool {
        self.transport().is_some_and(TransportError::is_correlation_error)
    }
}
