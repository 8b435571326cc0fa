//! Generic bounded-retry primitive.
//!
//! Repeatedly evaluates a success predicate, then a failure predicate,
//! at a fixed interval up to a maximum attempt count. Carries no domain
//! knowledge; the authentication wait and the per-file processing wait
//! both run on it with different probes and budgets.

use std::time::Duration;

use async_trait::async_trait;
use enhancer_core_types::PollOutcome;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Retry budget for one [`poll`] invocation. The wall-clock bound is
/// `interval * max_attempts` plus predicate-evaluation cost.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
    /// Emit a progress line every this many attempts; 0 disables.
    pub progress_every: u32,
}

impl PollConfig {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            progress_every: 6,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        // 5s * 180 attempts: the ~15 minute processing ceiling.
        Self::new(Duration::from_secs(5), 180)
    }
}

/// The predicates one poll invocation evaluates.
#[async_trait]
pub trait PollProbe: Send + Sync {
    /// Checked first on every attempt.
    async fn success(&self) -> bool;

    /// Checked when `success` is false; true short-circuits the loop.
    async fn failure(&self) -> bool {
        false
    }

    /// Context attached to progress lines, typically the labels of the
    /// currently visible actionable elements.
    async fn diagnostics(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Run the bounded wait to one of its three terminal outcomes.
pub async fn poll(config: &PollConfig, probe: &dyn PollProbe) -> PollOutcome {
    let started = Instant::now();
    for attempt in 0..config.max_attempts {
        if probe.success().await {
            debug!(attempt, "poll resolved: success");
            return PollOutcome::Success;
        }
        if probe.failure().await {
            debug!(attempt, "poll resolved: error detected");
            return PollOutcome::ErrorDetected;
        }
        if config.progress_every > 0 && attempt > 0 && attempt % config.progress_every == 0 {
            let labels = probe.diagnostics().await;
            info!(
                elapsed_s = started.elapsed().as_secs(),
                attempt,
                max_attempts = config.max_attempts,
                visible = ?labels,
                "still waiting"
            );
        }
        sleep(config.interval).await;
    }
    debug!(
        max_attempts = config.max_attempts,
        "poll exhausted its budget"
    );
    PollOutcome::Timeout
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CountingProbe {
        calls: AtomicU32,
        succeed_at: Option<u32>,
        fail_at: Option<u32>,
    }

    impl CountingProbe {
        fn new(succeed_at: Option<u32>, fail_at: Option<u32>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                succeed_at,
                fail_at,
            }
        }
    }

    #[async_trait]
    impl PollProbe for CountingProbe {
        async fn success(&self) -> bool {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.succeed_at.is_some_and(|at| call >= at)
        }

        async fn failure(&self) -> bool {
            let call = self.calls.load(Ordering::SeqCst).saturating_sub(1);
            self.fail_at.is_some_and(|at| call >= at)
        }
    }

    fn quick(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(5),
            max_attempts,
            progress_every: 0,
        }
    }

    #[tokio::test]
    async fn immediate_success_skips_sleeping() {
        let probe = CountingProbe::new(Some(0), None);
        let started = Instant::now();
        let outcome = poll(&quick(100), &probe).await;
        assert_eq!(outcome, PollOutcome::Success);
        assert!(started.elapsed() < Duration::from_millis(50));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_is_evaluated_before_failure() {
        // Both predicates fire on the same attempt; success must win.
        let probe = CountingProbe::new(Some(0), Some(0));
        assert_eq!(poll(&quick(10), &probe).await, PollOutcome::Success);
    }

    #[tokio::test]
    async fn detected_error_short_circuits() {
        let probe = CountingProbe::new(None, Some(2));
        assert_eq!(poll(&quick(10), &probe).await, PollOutcome::ErrorDetected);
        assert!(probe.calls.load(Ordering::SeqCst) < 10);
    }

    #[tokio::test]
    async fn exhausted_budget_times_out_within_bound() {
        let probe = CountingProbe::new(None, None);
        let config = quick(5);
        let started = Instant::now();
        let outcome = poll(&config, &probe).await;
        let elapsed = started.elapsed();
        assert_eq!(outcome, PollOutcome::Timeout);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 5);
        assert!(elapsed >= Duration::from_millis(25));
        // interval * max_attempts plus scheduling slack.
        assert!(elapsed < Duration::from_millis(250));
    }
}
