use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    /// One trial call allowed through
    HalfOpen,
}

/// Stops calling a failing dependency for `reset_timeout` after
/// `failure_threshold` consecutive failures.
///
/// Every call admitted by `check` must report back through
/// `record_success` or `record_failure`; the half-open trial stays claimed
/// until it does.
pub struct CircuitBreaker {
    pub name: String,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    last_failure: RwLock<Option<Instant>>,
    trial_in_flight: AtomicBool,
}

impl CircuitBreaker {
    pub fn new(name: &str, failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            last_failure: RwLock::new(None),
            trial_in_flight: AtomicBool::new(false),
        }
    }

    pub async fn state(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a call may proceed
    pub async fn check(&self) -> bool {
        if *self.state.read().await == CircuitState::Closed {
            return true;
        }

        let mut state = self.state.write().await;
        let current = *state;
        match current {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => !self.trial_in_flight.swap(true, Ordering::SeqCst),
            CircuitState::Open => {
                let expired = self
                    .last_failure
                    .read()
                    .await
                    .is_some_and(|at| at.elapsed() >= self.reset_timeout);
                if expired {
                    *state = CircuitState::HalfOpen;
                    self.trial_in_flight.store(true, Ordering::SeqCst);
                    info!("Circuit breaker [{}] half-open", self.name);
                }
                expired
            }
        }
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            info!("Circuit breaker [{}] closed again", self.name);
        }
        *state = CircuitState::Closed;
        self.failure_count.store(0, Ordering::SeqCst);
        self.trial_in_flight.store(false, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            *self.last_failure.write().await = Some(Instant::now());
            error!("Circuit breaker [{}] open after {} failures", self.name, count);
        }
        self.trial_in_flight.store(false, Ordering::SeqCst);
    }
}
