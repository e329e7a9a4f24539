//! Cancellable per-second ticker tied to a running activity's lifetime.
//!
//! The task is aborted when the handle drops, so cancelling a run or scoring
//! it can never leave a timer mutating a discarded run's counters.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub struct ActivityTicker {
    handle: JoinHandle<()>,
}

impl ActivityTicker {
    /// Spawn a ticker firing every `interval_ms`. The callback returns `false`
    /// to stop the loop (e.g., the activity it was feeding is gone).
    pub fn spawn<F, Fut>(interval_ms: u64, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(interval_ms.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; skip it so accrual starts
            // one full interval after spawn.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !on_tick().await {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for ActivityTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
