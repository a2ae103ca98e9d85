//! Process-wide request pacing.
//!
//! One [`RateGovernor`] is owned by the orchestrator and lent to every source
//! extractor, so all outbound requests share a single budget no matter which
//! site they target. Two rules apply:
//!
//! - at least `min_delay` between consecutive requests
//! - after every `cooldown_every` requests, one long `cooldown` pause instead
//!
//! State sits behind a `tokio::sync::Mutex`, so concurrent callers queue up
//! behind each other rather than racing past the pacing check.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::config::GovernorConfig;

#[derive(Debug, Default)]
struct GovernorState {
    last_request: Option<Instant>,
    request_count: u64,
}

#[derive(Debug)]
pub struct RateGovernor {
    min_delay: Duration,
    cooldown_every: u64,
    cooldown: Duration,
    state: Mutex<GovernorState>,
}

impl RateGovernor {
    pub fn new(config: &GovernorConfig) -> Self {
        Self {
            min_delay: Duration::from_millis(config.min_delay_ms),
            cooldown_every: config.cooldown_every,
            cooldown: Duration::from_millis(config.cooldown_ms),
            state: Mutex::new(GovernorState::default()),
        }
    }

    /// Block until it is safe to issue the next request.
    pub async fn wait(&self) {
        let mut state = self.state.lock().await;
        let delay = self.planned_delay(&state, Instant::now());
        if !delay.is_zero() {
            debug!(
                request_count = state.request_count,
                delay_ms = delay.as_millis() as u64,
                "Rate governor pausing"
            );
            sleep(delay).await;
        }
        state.last_request = Some(Instant::now());
        state.request_count += 1;
    }

    /// Start a fresh budget. Called once per ingestion run.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = GovernorState::default();
        info!("Rate governor reset");
    }

    pub async fn request_count(&self) -> u64 {
        self.state.lock().await.request_count
    }

    fn planned_delay(&self, state: &GovernorState, now: Instant) -> Duration {
        let cooldown_due = self.cooldown_every > 0
            && state.request_count > 0
            && state.request_count % self.cooldown_every == 0;
        if cooldown_due {
            return self.cooldown;
        }
        match state.last_request {
            Some(last) => self.min_delay.saturating_sub(now.duration_since(last)),
            None => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor(min_delay_ms: u64, cooldown_every: u64, cooldown_ms: u64) -> RateGovernor {
        RateGovernor::new(&GovernorConfig { min_delay_ms, cooldown_every, cooldown_ms })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let g = governor(4_000, 5, 10_000);
        let t0 = Instant::now();
        g.wait().await;
        assert_eq!(t0.elapsed(), Duration::ZERO);
        assert_eq!(g.request_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_delay_between_requests() {
        let g = governor(4_000, 0, 0);
        g.wait().await;
        let t0 = Instant::now();
        g.wait().await;
        assert_eq!(t0.elapsed(), Duration::from_millis(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_towards_delay() {
        let g = governor(4_000, 0, 0);
        g.wait().await;
        sleep(Duration::from_millis(3_000)).await;
        let t0 = Instant::now();
        g.wait().await;
        assert_eq!(t0.elapsed(), Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_after_every_nth_request() {
        let g = governor(4_000, 5, 10_000);
        let t0 = Instant::now();
        for _ in 0..5 {
            g.wait().await;
        }
        // one immediate request, then four min-delay gaps
        assert_eq!(t0.elapsed(), Duration::from_millis(16_000));

        let t1 = Instant::now();
        g.wait().await;
        assert_eq!(t1.elapsed(), Duration::from_millis(10_000));
        assert_eq!(g.request_count().await, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_budget() {
        let g = governor(4_000, 5, 10_000);
        g.wait().await;
        g.wait().await;
        g.reset().await;
        assert_eq!(g.request_count().await, 0);
        let t0 = Instant::now();
        g.wait().await;
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }
}
