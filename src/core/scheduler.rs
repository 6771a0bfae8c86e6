//! Fixed-interval cycle scheduler
//!
//! Runs a cycle immediately, then once per interval. Cycles are awaited one
//! at a time off a single `Interval`, so they never overlap. A cycle that
//! outlives the interval is followed by one immediate tick, after which the
//! regular cadence resumes.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};

use crate::error::Result;

/// Drives reconciliation cycles on a fixed cadence
pub struct Scheduler {
    period: Duration,
}

impl Scheduler {
    /// Create a scheduler; `period` must be non-zero
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    fn ticker(&self) -> Interval {
        let mut tick = interval(self.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tick
    }

    /// Run cycles forever, logging and swallowing every error
    pub async fn run<F, Fut, T>(&self, mut cycle: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Debug,
    {
        let mut tick = self.ticker();
        let start = Instant::now();
        loop {
            tick.tick().await;
            let fired = Instant::now();
            self.run_one(&mut cycle, start, fired).await;
        }
    }

    /// Run exactly `ticks` cycles, then return
    pub async fn run_ticks<F, Fut, T>(&self, ticks: u64, mut cycle: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Debug,
    {
        let mut tick = self.ticker();
        let start = Instant::now();
        for _ in 0..ticks {
            tick.tick().await;
            let fired = Instant::now();
            self.run_one(&mut cycle, start, fired).await;
        }
    }

    async fn run_one<F, Fut, T>(&self, cycle: &mut F, start: Instant, fired: Instant)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Debug,
    {
        match cycle().await {
            Ok(outcome) => tracing::debug!(?outcome, "Reconciliation cycle finished"),
            Err(e) => tracing::error!(error = %e, "Error updating ECR"),
        }

        // An overdue tick fires as soon as the cycle returns
        let next = start + next_tick_offset(self.period, fired.duration_since(start));
        let wait = next.saturating_duration_since(Instant::now());
        if let Ok(wait) = chrono::Duration::from_std(wait) {
            tracing::info!(next_run = %(Utc::now() + wait), "Waiting for next cycle");
        }
    }
}

/// Offset from `start` of the first tick scheduled after one fired at `fired`
///
/// Ticks stay aligned to multiples of `period`; a late tick skips the
/// deadlines it missed instead of replaying them.
fn next_tick_offset(period: Duration, fired: Duration) -> Duration {
    let elapsed_periods = fired.as_nanos() / period.as_nanos().max(1);
    let next = (elapsed_periods + 1).min(u32::MAX as u128) as u32;
    period * next
}
