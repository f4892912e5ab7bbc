use std::time::Duration;

use derive_more::Display;
use log::{debug, trace};
use tokio::select;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// The lifecycle states of a collector.
#[derive(Debug, Display, Copy, Clone, PartialEq)]
pub enum CollectorState {
    /// Indicates that polling rounds are being triggered.
    #[display("Running")]
    Running,
    /// Indicates that no more polling rounds will be triggered.
    #[display("Stopped")]
    Stopped,
}

/// Triggers a task on a fixed interval until it's stopped.
/// Each scheduler owns its own cancellation token, multiple schedulers never influence each other.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl Scheduler {
    /// Start invoking the given tick every `interval`.
    /// The first tick happens after one full interval has elapsed.
    ///
    /// # Panics
    ///
    /// Panics if the interval is zero or when not called from within a tokio runtime.
    pub fn start<F>(interval: Duration, tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => tick(),
                }
            }
            debug!("Scheduler with interval {:?} stopped", interval);
        });

        Self {
            interval,
            cancellation_token,
        }
    }

    /// Returns the interval between two ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current state of the scheduler.
    pub fn state(&self) -> CollectorState {
        if self.cancellation_token.is_cancelled() {
            CollectorState::Stopped
        } else {
            CollectorState::Running
        }
    }

    /// Cancel all future ticks of the scheduler.
    /// Calling this more than once has no effect.
    pub fn stop(&self) {
        if !self.cancellation_token.is_cancelled() {
            trace!("Stopping scheduler with interval {:?}", self.interval);
            self.cancellation_token.cancel();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_scheduler(interval: Duration) -> (Scheduler, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let scheduler = Scheduler::start(interval, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        (scheduler, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(1));

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(0, ticks.load(Ordering::SeqCst), "expected no tick before the first interval");

        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(1, ticks.load(Ordering::SeqCst));

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(3, ticks.load(Ordering::SeqCst));
        assert_eq!(CollectorState::Running, scheduler.state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(1));
        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(1, ticks.load(Ordering::SeqCst));

        scheduler.stop();
        scheduler.stop();
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(1, ticks.load(Ordering::SeqCst), "expected no more ticks after stop");
        assert_eq!(CollectorState::Stopped, scheduler.state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_schedulers() {
        let (first, first_ticks) = counting_scheduler(Duration::from_secs(1));
        let (second, second_ticks) = counting_scheduler(Duration::from_secs(1));

        first.stop();
        time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(0, first_ticks.load(Ordering::SeqCst));
        assert_eq!(2, second_ticks.load(Ordering::SeqCst));
        assert_eq!(CollectorState::Stopped, first.state());
        assert_eq!(CollectorState::Running, second.state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_secs(1));

        drop(scheduler);
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(0, ticks.load(Ordering::SeqCst));
    }
}
