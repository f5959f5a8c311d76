//! Circuit breaker guarding the downstream queue
//!
//! Stops wasting calls on a failing downstream: once the failure ratio over a
//! rolling sampling window crosses the configured threshold (with enough
//! throughput to be meaningful), the circuit opens and attempts are rejected
//! immediately for the break duration.
//!
//! # State Transitions
//!
//! ```text
//! ┌─────────┐  ratio ≥ threshold over ≥ min throughput  ┌──────┐
//! │ Closed  │ ────────────────────────────────────────> │ Open │
//! └─────────┘                                           └──────┘
//!     ^                                                    │
//!     │                                                    │ Break duration elapsed
//!     │                                                    v
//!     │  Probe succeeds              ┌───────────────┐
//!     └──────────────────────────────│   Half-Open   │
//!                                    └───────────────┘
//!                                            │
//!                                            │ Probe fails
//!                                            v
//!                                       ┌──────┐
//!                                       │ Open │
//!                                       └──────┘
//! ```
//!
//! One breaker instance protects one downstream; overlapping publish calls
//! share it, so all state lives behind a mutex. Denied attempts fail fast —
//! they consume no backoff delay and are not recorded into the window.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure ratio within the sampling window required to open the circuit
    #[serde(default = "default_failure_ratio")]
    pub failure_ratio: f64,

    /// Minimum number of sampled attempts before the ratio is meaningful
    #[serde(default = "default_minimum_throughput")]
    pub minimum_throughput: usize,

    /// Rolling window over which attempt outcomes are sampled (milliseconds)
    #[serde(default = "default_sampling_window_ms")]
    pub sampling_window_ms: u64,

    /// How long the circuit stays open before probing recovery (milliseconds)
    #[serde(default = "default_break_duration_ms")]
    pub break_duration_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_ratio: default_failure_ratio(),
            minimum_throughput: default_minimum_throughput(),
            sampling_window_ms: default_sampling_window_ms(),
            break_duration_ms: default_break_duration_ms(),
        }
    }
}

const fn default_failure_ratio() -> f64 {
    0.5 // Open once half the sampled attempts fail
}

const fn default_minimum_throughput() -> usize {
    3 // Require at least 3 samples before tripping
}

const fn default_sampling_window_ms() -> u64 {
    60_000 // Sample outcomes over the last 60 seconds
}

const fn default_break_duration_ms() -> u64 {
    30_000 // Keep the circuit open for 30 seconds
}

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - attempts pass through, outcomes are sampled
    Closed,
    /// Circuit tripped - reject attempts immediately
    Open,
    /// Testing recovery - a single probe attempt is allowed through
    HalfOpen,
}

/// One sampled attempt outcome
#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    success: bool,
}

/// Mutable breaker state, guarded by the outer mutex
#[derive(Debug)]
struct CircuitBreakerData {
    state: CircuitState,
    /// Rolling window of attempt outcomes, oldest first
    window: VecDeque<Sample>,
    /// When the circuit was last opened
    opened_at: Option<Instant>,
    /// Whether a half-open probe is currently in flight
    probe_in_flight: bool,
}

impl CircuitBreakerData {
    const fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::new(),
            opened_at: None,
            probe_in_flight: false,
        }
    }

    /// Drop samples older than the sampling window
    fn prune(&mut self, window: Duration) {
        let now = Instant::now();
        while let Some(sample) = self.window.front() {
            if now.duration_since(sample.at) > window {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn failure_count(&self) -> usize {
        self.window.iter().filter(|sample| !sample.success).count()
    }

    /// Failure ratio over the current window (0.0 when empty)
    fn failure_ratio(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.failure_count() as f64 / self.window.len() as f64
        }
    }

    /// Check if the break duration has elapsed (circuit can probe recovery)
    fn is_break_expired(&self, break_duration: Duration) -> bool {
        self.opened_at
            .is_some_and(|opened_at| Instant::now().duration_since(opened_at) >= break_duration)
    }
}

/// Circuit breaker governor
///
/// Constructed once per publisher and injected, never a hidden singleton, so
/// tests can build fresh instances for isolation.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    data: parking_lot::Mutex<CircuitBreakerData>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker in the closed state
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            data: parking_lot::Mutex::new(CircuitBreakerData::new()),
        }
    }

    /// Ask for permission to perform one attempt
    ///
    /// Returns `true` if the attempt may proceed. In the half-open state only
    /// a single probe is allowed through; further requests are denied until
    /// the probe's outcome has been recorded.
    pub fn try_acquire(&self) -> bool {
        let mut data = self.data.lock();
        match data.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if data.is_break_expired(self.break_duration()) {
                    data.state = CircuitState::HalfOpen;
                    data.probe_in_flight = true;
                    tracing::info!("Circuit breaker entering HALF-OPEN state, probing recovery");
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if data.probe_in_flight {
                    false
                } else {
                    data.probe_in_flight = true;
                    true
                }
            }
        }
    }

    /// Record the outcome of an attempt that was allowed through
    ///
    /// Updates the rolling window and may trip or close the circuit. Rejected
    /// attempts must not be recorded — no call was made for them.
    pub fn record_outcome(&self, success: bool) {
        let mut data = self.data.lock();
        match data.state {
            CircuitState::Closed => {
                data.prune(self.sampling_window());
                data.window.push_back(Sample {
                    at: Instant::now(),
                    success,
                });

                if !success
                    && data.window.len() >= self.config.minimum_throughput
                    && data.failure_ratio() >= self.config.failure_ratio
                {
                    data.state = CircuitState::Open;
                    data.opened_at = Some(Instant::now());
                    tracing::warn!(
                        samples = data.window.len(),
                        failure_ratio = data.failure_ratio(),
                        threshold = self.config.failure_ratio,
                        break_duration_ms = self.config.break_duration_ms,
                        "Circuit breaker OPENED, rejecting attempts against failing downstream"
                    );
                }
            }
            CircuitState::HalfOpen => {
                data.probe_in_flight = false;
                if success {
                    data.state = CircuitState::Closed;
                    data.window.clear();
                    data.opened_at = None;
                    tracing::info!("Circuit breaker CLOSED, normal operation resumed");
                } else {
                    data.state = CircuitState::Open;
                    data.opened_at = Some(Instant::now());
                    tracing::warn!("Circuit breaker probe failed, reopening circuit");
                }
            }
            CircuitState::Open => {
                // Late completion of a call begun before the circuit opened
                tracing::debug!(success, "Attempt outcome recorded while circuit is open");
            }
        }
    }

    /// Get the current circuit state
    pub fn state(&self) -> CircuitState {
        self.data.lock().state
    }

    /// Get statistics for monitoring and debugging
    pub fn stats(&self) -> CircuitBreakerStats {
        let mut data = self.data.lock();
        data.prune(self.sampling_window());
        CircuitBreakerStats {
            state: data.state,
            samples: data.window.len(),
            failures: data.failure_count(),
            failure_ratio: data.failure_ratio(),
        }
    }

    fn sampling_window(&self) -> Duration {
        Duration::from_millis(self.config.sampling_window_ms)
    }

    fn break_duration(&self) -> Duration {
        Duration::from_millis(self.config.break_duration_ms)
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    /// Current circuit state
    pub state: CircuitState,
    /// Number of samples in the rolling window
    pub samples: usize,
    /// Number of failed samples in the rolling window
    pub failures: usize,
    /// Failure ratio over the rolling window
    pub failure_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_ratio: 0.5,
            minimum_throughput: 3,
            sampling_window_ms: 60_000,
            break_duration_ms: 5_000,
        }
    }

    #[test]
    fn test_defaults() {
        let config = CircuitBreakerConfig::default();
        assert!((config.failure_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.minimum_throughput, 3);
        assert_eq!(config.sampling_window_ms, 60_000);
        assert_eq!(config.break_duration_ms, 30_000);
    }

    #[test]
    fn test_closed_to_open_requires_throughput_and_ratio() {
        let breaker = CircuitBreaker::new(test_config());
        assert_eq!(breaker.state(), CircuitState::Closed);

        // Two failures: ratio 1.0 but throughput below the minimum
        breaker.record_outcome(false);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());

        // Third failure crosses the minimum throughput
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());
    }

    #[test]
    fn test_successes_keep_ratio_below_threshold() {
        let breaker = CircuitBreaker::new(test_config());

        // 1 failure out of 4 samples: ratio 0.25 < 0.5
        breaker.record_outcome(true);
        breaker.record_outcome(true);
        breaker.record_outcome(true);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Closed);

        // 3 failures out of 6: ratio 0.5 trips
        breaker.record_outcome(false);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_half_open_allows_single_probe() {
        let config = CircuitBreakerConfig {
            break_duration_ms: 0, // Immediate half-open for testing
            ..test_config()
        };
        let breaker = CircuitBreaker::new(config);

        breaker.record_outcome(false);
        breaker.record_outcome(false);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Open);

        // Break duration elapsed: exactly one probe allowed
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.try_acquire());

        // Probe success closes the circuit and resets the window
        breaker.record_outcome(true);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().samples, 0);
        assert!(breaker.try_acquire());
    }

    #[test]
    fn test_half_open_probe_failure_reopens() {
        let config = CircuitBreakerConfig {
            break_duration_ms: 0,
            ..test_config()
        };
        let breaker = CircuitBreaker::new(config);

        breaker.record_outcome(false);
        breaker.record_outcome(false);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_sampling_window_expiry() {
        let config = CircuitBreakerConfig {
            sampling_window_ms: 50,
            ..test_config()
        };
        let breaker = CircuitBreaker::new(config);

        breaker.record_outcome(false);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Closed);

        // Let the window roll past the first two failures
        std::thread::sleep(Duration::from_millis(80));

        // This failure starts a fresh window: throughput 1, no trip
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.stats().samples, 1);
    }

    #[test]
    fn test_open_circuit_rejects_until_break_elapses() {
        let config = CircuitBreakerConfig {
            break_duration_ms: 60_000,
            ..test_config()
        };
        let breaker = CircuitBreaker::new(config);

        breaker.record_outcome(false);
        breaker.record_outcome(false);
        breaker.record_outcome(false);
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(!breaker.try_acquire());
        assert!(!breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn test_stats_snapshot() {
        let breaker = CircuitBreaker::new(test_config());

        breaker.record_outcome(true);
        breaker.record_outcome(false);

        let stats = breaker.stats();
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.failures, 1);
        assert!((stats.failure_ratio - 0.5).abs() < f64::EPSILON);
    }
}
