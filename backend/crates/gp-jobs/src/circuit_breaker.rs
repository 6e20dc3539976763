use gp_config::CircuitBreakerConfig;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - requests flow through
    Closed,
    /// Too many failures - requests rejected immediately
    Open,
    /// Cooldown elapsed - a single probe is outstanding
    HalfOpen,
}

#[derive(Error, Debug)]
pub enum BreakerError<E> {
    #[error("Circuit breaker open")]
    Open,

    #[error("{0}")]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    probe_in_flight: bool,
}

/// Thread-safe circuit breaker.
///
/// Opens after `failure_threshold` consecutive failures. Once `open_duration`
/// has passed since the last failure exactly one probe is let through; its
/// outcome closes or re-opens the circuit.
pub struct CircuitBreaker {
    failure_threshold: u32,
    open_duration: Duration,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, open_duration: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            open_duration,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.open_duration_secs),
        )
    }

    /// Run `operation` unless the circuit is open.
    ///
    /// A probe whose future is dropped before completing is recorded as a
    /// failure, so the breaker cannot stay half-open forever.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let is_probe = self.admit().ok_or(BreakerError::Open)?;

        let mut abandoned = AbandonedProbe {
            breaker: self,
            armed: is_probe,
        };
        let result = operation().await;
        abandoned.armed = false;

        match result {
            Ok(value) => {
                self.on_success(is_probe);
                Ok(value)
            }
            Err(e) => {
                self.on_failure(is_probe);
                Err(BreakerError::Inner(e))
            }
        }
    }

    /// Get current state
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Record a successful request
    pub fn record_success(&self) {
        self.on_success(false);
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        self.on_failure(false);
    }

    /// Only the half-open trial moves the circuit out of HalfOpen. Results of
    /// calls admitted while closed count only while it is still closed.
    fn on_success(&self, trial: bool) {
        let mut inner = self.lock();

        if trial {
            info!("Circuit breaker closed after successful probe");
            inner.probe_in_flight = false;
        } else if inner.state != CircuitState::Closed {
            return;
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
    }

    fn on_failure(&self, trial: bool) {
        let mut inner = self.lock();

        if !trial && inner.state != CircuitState::Closed {
            return;
        }
        inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
        inner.last_failure = Some(Instant::now());

        if trial {
            inner.probe_in_flight = false;
            inner.state = CircuitState::Open;
            warn!("Circuit breaker probe failed, reopening");
        } else if inner.consecutive_failures >= self.failure_threshold {
            inner.state = CircuitState::Open;
            warn!(
                "Circuit breaker OPEN after {} consecutive failures",
                inner.consecutive_failures
            );
        }
    }

    /// `Some(is_probe)` if a request may proceed
    fn admit(&self) -> Option<bool> {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => {
                let cooled = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() >= self.open_duration);
                if !cooled || inner.probe_in_flight {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.probe_in_flight = true;
                info!("Circuit breaker transitioning to HalfOpen, admitting probe");
                Some(true)
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    return None;
                }
                inner.probe_in_flight = true;
                Some(true)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct AbandonedProbe<'a> {
    breaker: &'a CircuitBreaker,
    armed: bool,
}

impl Drop for AbandonedProbe<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Circuit breaker probe abandoned before completing");
            self.breaker.on_failure(true);
        }
    }
}
