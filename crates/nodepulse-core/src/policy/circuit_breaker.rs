//! Three-state circuit breaker guarding a single endpoint.
//!
//! State transitions:
//! - `Closed` → `Open`:      `failure_threshold` consecutive failures
//! - `Open` → `HalfOpen`:    `open_duration` has elapsed
//! - `HalfOpen` → `Closed`:  `success_threshold` probes succeed
//! - `HalfOpen` → `Open`:    a probe fails

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    /// Calls fail fast until `open_duration` has passed.
    Open,
    /// Calls go through as probes.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_duration: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

struct Counters {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

/// Thread-safe circuit breaker.
pub struct CircuitBreaker {
    endpoint: String,
    config: CircuitBreakerConfig,
    counters: Mutex<Counters>,
}

impl CircuitBreaker {
    pub fn new(endpoint: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            config,
            counters: Mutex::new(Counters {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            }),
        }
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked.
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state; moves Open → HalfOpen once the open window has elapsed.
    pub fn state(&self) -> CircuitState {
        let mut c = self.counters();
        if c.state == CircuitState::Open
            && c.opened_at
                .is_some_and(|t| t.elapsed() >= self.config.open_duration)
        {
            c.state = CircuitState::HalfOpen;
            c.successes = 0;
            tracing::info!(endpoint = %self.endpoint, "circuit breaker half-open");
        }
        c.state
    }

    pub fn is_allowed(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        let mut c = self.counters();
        match c.state {
            CircuitState::Closed => c.failures = 0,
            CircuitState::HalfOpen => {
                c.successes += 1;
                if c.successes >= self.config.success_threshold {
                    c.state = CircuitState::Closed;
                    c.failures = 0;
                    c.successes = 0;
                    c.opened_at = None;
                    tracing::info!(endpoint = %self.endpoint, "circuit breaker closed");
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut c = self.counters();
        match c.state {
            CircuitState::Closed => {
                c.failures += 1;
                if c.failures >= self.config.failure_threshold {
                    c.state = CircuitState::Open;
                    c.opened_at = Some(Instant::now());
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        failures = c.failures,
                        "circuit breaker open"
                    );
                }
            }
            CircuitState::HalfOpen => {
                c.state = CircuitState::Open;
                c.opened_at = Some(Instant::now());
                c.successes = 0;
                tracing::warn!(endpoint = %self.endpoint, "circuit breaker probe failed, reopening");
            }
            CircuitState::Open => {}
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}
