//! Автоматический выключатель для запросов к внешнему API билетов.
//!
//! Пока выключатель разомкнут, запросы не уходят в сеть, и опрос доступности
//! сразу переходит к локальному журналу бронирований.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::CircuitBreakerConfig;

/// Состояния выключателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// **Closed**: нормальный режим, запросы разрешены.
    Closed,
    /// **Open**: после серии сбоев запросы временно запрещены.
    Open,
    /// **HalfOpen**: после таймаута разрешается пробный запрос.
    HalfOpen,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    /// Счетчик последовательных сбоев.
    failure_count: AtomicU32,
    /// Момент последнего сбоя, миллисекунды от `started`.
    last_failure_ms: AtomicU64,
    started: Instant,
    failure_threshold: u32,
    timeout_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            last_failure_ms: AtomicU64::new(0),
            started: Instant::now(),
            failure_threshold: failure_threshold.max(1),
            timeout_duration: timeout,
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Проверяет, можно ли выполнить следующий запрос.
    pub fn can_execute(&self) -> bool {
        let state = *self.state.read().unwrap_or_else(PoisonError::into_inner);

        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let since_failure = self
                    .elapsed_ms()
                    .saturating_sub(self.last_failure_ms.load(Ordering::Relaxed));

                if since_failure >= self.timeout_duration.as_millis() as u64 {
                    *self.state.write().unwrap_or_else(PoisonError::into_inner) = CircuitState::HalfOpen;
                    info!("Circuit breaker transitioning to HalfOpen state");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        match *state {
            CircuitState::HalfOpen => {
                *state = CircuitState::Closed;
                self.failure_count.store(0, Ordering::Relaxed);
                info!("Circuit breaker recovered - transitioning to Closed state");
            }
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let failure_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_failure_ms.store(self.elapsed_ms(), Ordering::Relaxed);

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        match *state {
            CircuitState::Closed => {
                if failure_count >= self.failure_threshold {
                    *state = CircuitState::Open;
                    error!(
                        "Circuit breaker OPENED - {} failures reached threshold {}",
                        failure_count, self.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                *state = CircuitState::Open;
                warn!("Circuit breaker test failed - returning to Open state");
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.can_execute());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn success_resets_failures() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.failure_count(), 0);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_after_timeout_then_recovers() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn failed_probe_reopens() {
        let breaker = CircuitBreaker::new(1, Duration::ZERO);
        breaker.record_failure();
        assert!(breaker.can_execute());

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }
}
