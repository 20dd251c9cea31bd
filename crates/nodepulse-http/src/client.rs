//! HTTP JSON-RPC client backed by `reqwest`.
//!
//! Features:
//! - Per-call deadline covering every attempt and the backoff between them
//! - Automatic retry with exponential backoff for transient errors
//! - Circuit breaker for the endpoint
//! - Monotonic request ids for response correlation

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use nodepulse_core::error::TransportError;
use nodepulse_core::policy::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig, RetryPolicy,
};
use nodepulse_core::request::{JsonRpcRequest, JsonRpcResponse};
use nodepulse_core::transport::{HealthStatus, RpcTransport};

/// Configuration for `HttpRpcClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    /// Upper bound on one `send`, retries included.
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// HTTP JSON-RPC client for a single node endpoint.
///
/// The underlying `reqwest::Client` keeps a connection pool, so one client can
/// be shared by all extractors of a round.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    circuit: CircuitBreaker,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let url = url.into();
        let parsed =
            reqwest::Url::parse(&url).map_err(|e| TransportError::InvalidEndpoint(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint(format!(
                "{url}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            circuit: CircuitBreaker::new(url.clone(), config.circuit_breaker),
            url,
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpClientConfig::default())
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.circuit.state()
    }

    async fn send_once(
        &self,
        req: &JsonRpcRequest,
        budget: Duration,
    ) -> Result<JsonRpcResponse, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .timeout(budget)
            .json(req)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice::<JsonRpcResponse>(&body)?)
    }

    fn classify(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        if !self.circuit.is_allowed() {
            return Err(TransportError::CircuitOpen {
                endpoint: self.url.clone(),
            });
        }

        let deadline = Instant::now() + self.request_timeout;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let budget = deadline.saturating_duration_since(Instant::now());
            if budget.is_zero() {
                return Err(TransportError::Timeout {
                    ms: self.request_timeout.as_millis() as u64,
                });
            }
            match self.send_once(&req, budget).await {
                Ok(resp) => {
                    self.circuit.record_success();
                    return Ok(resp);
                }
                Err(e) if e.is_retryable() => {
                    self.circuit.record_failure();
                    match self.retry.next_delay(attempt) {
                        Some(delay) if self.circuit.is_allowed() && Instant::now() + delay < deadline => {
                            tracing::warn!(
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                method = %req.method,
                                url = %self.url,
                                "retrying request"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        _ => {
                            tracing::error!(
                                attempt,
                                error = %e,
                                method = %req.method,
                                url = %self.url,
                                "giving up on request"
                            );
                            return Err(e);
                        }
                    }
                }
                // Malformed body: the node answered, so the circuit stays closed.
                Err(e) => return Err(e),
            }
        }
    }

    fn health(&self) -> HealthStatus {
        match self.circuit.state() {
            CircuitState::Open => HealthStatus::Unhealthy,
            CircuitState::HalfOpen => HealthStatus::Degraded,
            CircuitState::Closed => HealthStatus::Healthy,
        }
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
