//! Retry policy with exponential backoff for provider calls
//!
//! Only errors classified as transient by [`ProviderError::is_retryable`] are
//! retried; anything else is returned after the first attempt.

use crate::providers::error::{ProviderError, ProviderResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default number of attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the initial one
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,

    /// Upper bound on a single delay (milliseconds)
    pub max_delay_ms: Option<u64>,

    /// Multiplier applied per attempt (2.0 doubles the delay)
    pub exponential_base: f64,

    /// Jitter factor (0.0 to 1.0) to randomize delays
    pub jitter_factor: f64,

    /// Prefer a server-provided retry-after over the computed delay
    pub respect_retry_after: bool,

    /// Maximum total time to spend retrying (milliseconds)
    pub timeout_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: 1_000,
            max_delay_ms: None,
            exponential_base: 2.0,
            jitter_factor: 0.0,
            respect_retry_after: false,
            timeout_ms: None,
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt limit
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Policy that makes a single attempt
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Delay before retry number `retry` (0-based)
    pub fn calculate_delay(&self, retry: u32, error: &ProviderError) -> Duration {
        if self.respect_retry_after {
            if let Some(retry_after) = error.retry_after() {
                return retry_after;
            }
        }

        let base_delay = self.initial_delay_ms as f64 * self.exponential_base.powi(retry as i32);
        let capped_delay = match self.max_delay_ms {
            Some(max) => base_delay.min(max as f64),
            None => base_delay,
        };

        let delay_with_jitter = if self.jitter_factor > 0.0 {
            let mut rng = rand::thread_rng();
            let jitter_range = capped_delay * self.jitter_factor;
            let jitter = rng.gen_range(-jitter_range..=jitter_range);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_millis(delay_with_jitter as u64)
    }

    /// Whether another attempt is allowed after `attempts` failed ones
    pub fn should_retry(&self, error: &ProviderError, attempts: u32) -> bool {
        attempts < self.max_attempts && error.is_retryable()
    }
}

/// Per-call bookkeeping while retrying
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Attempts made so far
    pub attempts: u32,

    /// Sum of all backoff delays slept so far
    pub total_delay: Duration,

    /// Most recent failure
    pub last_error: Option<ProviderError>,
}

/// Outcome of a retried operation
#[derive(Debug)]
pub struct RetryResult<T> {
    pub result: ProviderResult<T>,
    pub state: RetryState,
}

/// Runs an operation under a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    label: String,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            label: "provider".to_string(),
        }
    }

    /// Name used in retry diagnostics
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute, returning only the final result
    pub async fn execute<F, T, Fut>(&self, operation: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        self.run(operation).await.result
    }

    /// Execute and report the retry bookkeeping alongside the result
    pub async fn run<F, T, Fut>(&self, mut operation: F) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let mut state = RetryState::default();
        let start_time = Instant::now();

        loop {
            state.attempts += 1;

            let error = match operation().await {
                Ok(value) => {
                    if state.attempts > 1 {
                        debug!(
                            provider = %self.label,
                            attempts = state.attempts,
                            "Call succeeded after retrying"
                        );
                    }
                    return RetryResult {
                        result: Ok(value),
                        state,
                    };
                }
                Err(error) => error,
            };

            if !self.policy.should_retry(&error, state.attempts) {
                return RetryResult {
                    result: Err(error),
                    state,
                };
            }

            if let Some(timeout_ms) = self.policy.timeout_ms {
                if start_time.elapsed() >= Duration::from_millis(timeout_ms) {
                    warn!(
                        provider = %self.label,
                        attempts = state.attempts,
                        "Retry time budget exhausted"
                    );
                    return RetryResult {
                        result: Err(error),
                        state,
                    };
                }
            }

            let delay = self.policy.calculate_delay(state.attempts - 1, &error);
            warn!(
                provider = %self.label,
                error_kind = error.kind(),
                attempt = state.attempts,
                wait_secs = delay.as_secs_f64(),
                "{}\nRetry in {:.1} seconds.",
                error,
                delay.as_secs_f64()
            );

            state.total_delay += delay;
            state.last_error = Some(error);
            tokio::time::sleep(delay).await;
        }
    }
}
