//! Circuit breaker state machine.
//!
//! # State Transitions
//! ```text
//! Closed → Open:       failure_count >= failure_threshold
//! Open → Half-Open:    retry_timeout elapsed (checked at call time)
//! Half-Open → Closed:  probe succeeds
//! Half-Open → Open:    probe fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - Admission and settlement are separate steps so the upstream call runs
//!   outside the breaker's critical section
//! - A `CallPermit` ties the two steps together; a probe permit is an RAII
//!   guard over the Half-Open single-probe latch, so a call that is
//!   cancelled mid-flight releases the latch on drop instead of wedging
//!   the breaker
//! - The record lives behind one async mutex; the decision to call and
//!   every transition are atomic with respect to concurrent callers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;

use super::outcome::RejectReason;
use crate::config::BreakerConfig;

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, calls pass through.
    Closed,
    /// Tripped; calls are short-circuited until the cooldown elapses.
    Open,
    /// Trial state; exactly one probe call is permitted.
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermitKind {
    Attempt,
    Probe,
}

/// Permission to attempt one call, handed out by [`CircuitBreaker::admit`].
///
/// Settled with `record_success` or `record_failure` once the attempt
/// completes. A probe permit holds the Half-Open single-probe latch and
/// releases it on drop, so a call cancelled between admission and
/// settlement (client disconnect, task abort) cannot leave the latch
/// stuck.
#[derive(Debug)]
pub struct CallPermit {
    kind: PermitKind,
    /// Present on probe permits until settled; dropping it releases the
    /// latch.
    breaker: Option<Arc<CircuitBreaker>>,
}

impl CallPermit {
    fn attempt() -> Self {
        Self {
            kind: PermitKind::Attempt,
            breaker: None,
        }
    }

    fn probe(breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            kind: PermitKind::Probe,
            breaker: Some(breaker),
        }
    }

    /// True if this call is the Half-Open recovery probe.
    pub fn is_probe(&self) -> bool {
        self.kind == PermitKind::Probe
    }

    /// Mark the permit as settled so its drop no longer touches the latch.
    fn disarm(&mut self) {
        self.breaker = None;
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        // Only an unsettled probe still holds the latch.
        if let Some(breaker) = self.breaker.take() {
            breaker.probe_in_flight.store(false, Ordering::SeqCst);
            tracing::debug!("Unsettled probe permit dropped, probe latch released");
        }
    }
}

/// Mutable breaker state. Exclusively owned by the breaker's mutex.
#[derive(Debug)]
struct BreakerRecord {
    state: CircuitState,
    /// Consecutive failures since the last success or reset.
    failure_count: u32,
    /// Set on every transition into Open; gates the cooldown check.
    opened_at: Option<Instant>,
}

/// Circuit breaker for a single endpoint.
pub struct CircuitBreaker {
    config: BreakerConfig,
    record: Mutex<BreakerRecord>,
    /// Half-Open latch: a probe has been admitted and has not yet settled.
    /// Atomic rather than part of the record so a `CallPermit` drop can
    /// release it without the async lock.
    probe_in_flight: AtomicBool,
}

impl CircuitBreaker {
    /// Create a new breaker in the Closed state.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            record: Mutex::new(BreakerRecord {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
            probe_in_flight: AtomicBool::new(false),
        }
    }

    fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.config.retry_timeout_ms)
    }

    /// Decide whether a call may be attempted right now.
    ///
    /// Returns a permit that is settled after the attempt (or releases the
    /// probe latch on drop if the attempt never settles), or the reason the
    /// call is rejected. Rejection has no side effects.
    pub async fn admit(self: &Arc<Self>) -> Result<CallPermit, RejectReason> {
        let mut record = self.record.lock().await;

        match record.state {
            CircuitState::Closed => Ok(CallPermit::attempt()),

            CircuitState::Open => {
                // opened_at is always set on entry to Open; a missing value
                // is treated as an elapsed cooldown.
                let elapsed = record
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::MAX);

                if elapsed <= self.retry_timeout() {
                    Err(RejectReason::CooldownActive {
                        retry_in: self.retry_timeout() - elapsed,
                    })
                } else {
                    // Cooldown elapsed: this call becomes the probe.
                    record.state = CircuitState::HalfOpen;
                    self.probe_in_flight.store(true, Ordering::SeqCst);
                    tracing::info!(elapsed = ?elapsed, "Circuit half-open, admitting probe");
                    Ok(CallPermit::probe(Arc::clone(self)))
                }
            }

            CircuitState::HalfOpen => {
                if self.probe_in_flight.swap(true, Ordering::SeqCst) {
                    Err(RejectReason::ProbeInFlight)
                } else {
                    Ok(CallPermit::probe(Arc::clone(self)))
                }
            }
        }
    }

    /// Settle a permitted call that succeeded.
    ///
    /// Closes the circuit and resets the failure count, whatever the
    /// current state.
    pub async fn record_success(&self, mut permit: CallPermit) {
        let mut record = self.record.lock().await;

        if permit.is_probe() {
            self.probe_in_flight.store(false, Ordering::SeqCst);
        }
        permit.disarm();

        if record.state != CircuitState::Closed {
            tracing::info!(from = ?record.state, "Circuit closed");
        }
        record.state = CircuitState::Closed;
        record.failure_count = 0;
        record.opened_at = None;
    }

    /// Settle a permitted call that failed.
    ///
    /// A failed probe reopens the circuit immediately and restarts the
    /// cooldown. A failed ordinary attempt counts toward the threshold.
    pub async fn record_failure(&self, mut permit: CallPermit) {
        let mut record = self.record.lock().await;

        match permit.kind {
            PermitKind::Probe => {
                self.probe_in_flight.store(false, Ordering::SeqCst);
                permit.disarm();
                record.state = CircuitState::Open;
                record.opened_at = Some(Instant::now());
                tracing::warn!("Probe failed, circuit re-opened");
            }
            PermitKind::Attempt => {
                record.failure_count += 1;

                // Only trip from Closed. If another caller already opened
                // the circuit while this attempt was in flight, counting is
                // enough; refreshing opened_at would extend the cooldown.
                if record.state == CircuitState::Closed
                    && record.failure_count >= self.config.failure_threshold
                {
                    record.state = CircuitState::Open;
                    record.opened_at = Some(Instant::now());
                    tracing::warn!(
                        failures = record.failure_count,
                        threshold = self.config.failure_threshold,
                        "Failure threshold reached, circuit opened"
                    );
                }
            }
        }
    }

    /// Current state (for tests and status reporting).
    pub async fn state(&self) -> CircuitState {
        self.record.lock().await.state
    }

    /// Consecutive failure count.
    pub async fn failure_count(&self) -> u32 {
        self.record.lock().await.failure_count
    }

    /// Snapshot for the status endpoint.
    pub async fn status(&self) -> BreakerStatus {
        let record = self.record.lock().await;

        let retry_in_ms = match record.state {
            CircuitState::Open => record.opened_at.map(|t| {
                self.retry_timeout()
                    .saturating_sub(t.elapsed())
                    .as_millis() as u64
            }),
            _ => None,
        };

        BreakerStatus {
            state: record.state,
            failure_count: record.failure_count,
            retry_in_ms,
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("failure_threshold", &self.config.failure_threshold)
            .field("retry_timeout_ms", &self.config.retry_timeout_ms)
            .finish()
    }
}

/// Point-in-time view of a breaker, served by `GET /breakers`.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStatus {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Remaining cooldown in milliseconds, when the circuit is Open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32, retry_timeout_ms: u64) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: threshold,
            retry_timeout_ms,
        }
    }

    fn breaker(threshold: u32, retry_timeout_ms: u64) -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(config(threshold, retry_timeout_ms)))
    }

    async fn fail_once(cb: &Arc<CircuitBreaker>) {
        let permit = cb.admit().await.expect("attempt should be admitted");
        cb.record_failure(permit).await;
    }

    #[tokio::test]
    async fn starts_closed_and_admits() {
        let cb = Arc::new(CircuitBreaker::new(BreakerConfig::default()));
        assert_eq!(cb.state().await, CircuitState::Closed);
        assert!(!cb.admit().await.unwrap().is_probe());
    }

    #[tokio::test]
    async fn stays_closed_below_threshold() {
        let cb = breaker(3, 5000);

        fail_once(&cb).await;
        fail_once(&cb).await;

        assert_eq!(cb.state().await, CircuitState::Closed);
        assert_eq!(cb.failure_count().await, 2);
        assert!(!cb.admit().await.unwrap().is_probe());
    }

    #[tokio::test]
    async fn opens_on_threshold_failure() {
        let cb = breaker(3, 5000);

        for _ in 0..3 {
            fail_once(&cb).await;
        }

        assert_eq!(cb.state().await, CircuitState::Open);
        match cb.admit().await {
            Err(RejectReason::CooldownActive { retry_in }) => {
                assert!(retry_in <= Duration::from_millis(5000));
            }
            other => panic!("expected cooldown rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let cb = breaker(3, 5000);

        fail_once(&cb).await;
        fail_once(&cb).await;

        let permit = cb.admit().await.unwrap();
        cb.record_success(permit).await;

        assert_eq!(cb.state().await, CircuitState::Closed);
        assert_eq!(cb.failure_count().await, 0);

        // Repeated successes keep the count at zero.
        for _ in 0..5 {
            let permit = cb.admit().await.unwrap();
            cb.record_success(permit).await;
        }
        assert_eq!(cb.failure_count().await, 0);
    }

    #[tokio::test]
    async fn admits_probe_after_cooldown() {
        let cb = breaker(2, 20);

        fail_once(&cb).await;
        fail_once(&cb).await;
        assert_eq!(cb.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cb.admit().await.unwrap().is_probe());
        assert_eq!(cb.state().await, CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn single_probe_latch() {
        let cb = breaker(2, 20);

        fail_once(&cb).await;
        fail_once(&cb).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        // First caller takes the probe; a second caller arriving while the
        // probe is outstanding is rejected without side effects.
        let probe = cb.admit().await.unwrap();
        assert!(probe.is_probe());
        assert!(matches!(
            cb.admit().await,
            Err(RejectReason::ProbeInFlight)
        ));

        // Once the probe settles, the latch is released.
        cb.record_success(probe).await;
        assert!(!cb.admit().await.unwrap().is_probe());
    }

    #[tokio::test]
    async fn dropped_probe_permit_releases_latch() {
        let cb = breaker(1, 10);

        fail_once(&cb).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The admitted probe call goes away without settling, as when the
        // caller's task is cancelled mid-flight.
        let probe = cb.admit().await.unwrap();
        assert!(probe.is_probe());
        drop(probe);

        // The latch is released: the next caller becomes the new probe
        // instead of being rejected from here on.
        let retry = cb.admit().await.unwrap();
        assert!(retry.is_probe());
        assert_eq!(cb.state().await, CircuitState::HalfOpen);

        cb.record_success(retry).await;
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn probe_success_closes() {
        let cb = breaker(2, 20);

        fail_once(&cb).await;
        fail_once(&cb).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let probe = cb.admit().await.unwrap();
        cb.record_success(probe).await;

        assert_eq!(cb.state().await, CircuitState::Closed);
        assert_eq!(cb.failure_count().await, 0);
    }

    #[tokio::test]
    async fn probe_failure_reopens_and_restarts_cooldown() {
        let cb = breaker(2, 40);

        fail_once(&cb).await;
        fail_once(&cb).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let probe = cb.admit().await.unwrap();
        cb.record_failure(probe).await;
        assert_eq!(cb.state().await, CircuitState::Open);

        // The cooldown restarted with the probe failure, so the circuit is
        // still rejecting shortly afterwards.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            cb.admit().await,
            Err(RejectReason::CooldownActive { .. })
        ));

        // And admits a new probe once the fresh cooldown elapses.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cb.admit().await.unwrap().is_probe());
    }

    #[tokio::test]
    async fn straggler_failure_does_not_refresh_cooldown() {
        let cb = breaker(2, 30);

        // Two attempts admitted while Closed, settled after the circuit
        // opened: the straggler counts but must not extend the cooldown.
        let first = cb.admit().await.unwrap();
        let straggler = cb.admit().await.unwrap();

        cb.record_failure(first).await;
        fail_once(&cb).await;
        assert_eq!(cb.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(25)).await;
        cb.record_failure(straggler).await;

        tokio::time::sleep(Duration::from_millis(15)).await;
        assert!(cb.admit().await.unwrap().is_probe());
    }

    #[tokio::test]
    async fn status_reports_cooldown() {
        let cb = breaker(1, 5000);

        fail_once(&cb).await;

        let status = cb.status().await;
        assert_eq!(status.state, CircuitState::Open);
        assert_eq!(status.failure_count, 1);
        assert!(status.retry_in_ms.is_some());
        assert!(status.retry_in_ms.unwrap() <= 5000);
    }
}
