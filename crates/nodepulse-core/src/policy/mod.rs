//! Reliability policy applied by transports around every call.
//!
//! ```text
//! Request → [CircuitBreaker] → [RetryPolicy] → [Transport]
//! ```

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{RetryConfig, RetryPolicy};
