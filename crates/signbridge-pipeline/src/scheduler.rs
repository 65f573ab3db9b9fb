//! A fixed-period, cancellable tick scheduler.
//!
//! Ticks are serialized: each tick's work is awaited inline on the loop
//! task, so a tick can never overlap a still-running predecessor, and a
//! period that elapses while work is in flight is skipped rather than
//! queued, bounding latency growth under slow ticks.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawns a fixed-period tick loop and hands back a cancellation handle.
#[derive(Debug, Clone, Copy)]
pub struct TickScheduler {
    period: Duration,
}

impl TickScheduler {
    /// Creates a scheduler with the given tick period.
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Starts the tick loop on a background task.
    ///
    /// `tick` is invoked once per period and awaited to completion before
    /// the next period is considered. Returns the handle used to stop the
    /// loop.
    pub fn spawn<F, Fut>(&self, mut tick: F) -> SchedulerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    // Check for cancellation before firing another tick, so a
                    // stop that arrived mid-tick ends the loop right after
                    // that tick completes.
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => tick().await,
                }
            }
            tracing::debug!("tick loop stopped");
        });
        SchedulerHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Cancellation handle for a running tick loop.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the loop and waits for it to wind down.
    ///
    /// A tick that is already executing runs to completion; no further tick
    /// starts afterwards.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }

    /// Whether the loop task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
