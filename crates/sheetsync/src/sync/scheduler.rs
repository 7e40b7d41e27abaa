//! Fixed-interval rescheduling with drift compensation
//!
//! The next cycle starts `interval` after the previous one *started*. A cycle
//! that overruns the interval is followed immediately by the next, with no
//! attempt to catch up on missed ticks.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct CycleScheduler {
    interval: Duration,
}

impl CycleScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait before the next cycle, given how long the last one took
    pub fn next_delay(&self, elapsed: Duration) -> Duration {
        self.interval.saturating_sub(elapsed)
    }

    /// Run `cycle` back to back until `shutdown` fires, returning the number
    /// of cycles completed. Shutdown is only observed between cycles; a
    /// cycle in progress always runs to completion.
    pub async fn run<F, Fut>(&self, mut cycle: F, shutdown: CancellationToken) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future,
    {
        info!("Scheduler started with a {:?} interval", self.interval);
        let mut completed = 0;

        while !shutdown.is_cancelled() {
            let start = Instant::now();
            cycle().await;
            completed += 1;

            let elapsed = start.elapsed();
            let delay = self.next_delay(elapsed);
            if delay.is_zero() {
                warn!(
                    "Process taking too long: cycle took {:?}, interval is {:?}; starting next cycle now",
                    elapsed, self.interval
                );
            } else {
                debug!("Next cycle in {:?}", delay);
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = sleep(delay) => {},
            }
        }

        info!("Scheduler stopped after {} cycles", completed);
        completed
    }
}
