use std::time::Duration;

use quiz_core::model::AttemptId;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed second for a specific attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    attempt: AttemptId,
}

impl CountdownTick {
    #[must_use]
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }
}

/// Background task emitting one [`CountdownTick`] per second.
///
/// The task is aborted when the handle is cancelled or dropped.
#[derive(Debug)]
pub(crate) struct Countdown {
    attempt: AttemptId,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Spawns the ticking task on the current Tokio runtime.
    pub(crate) fn start(attempt: AttemptId, ticks: UnboundedSender<CountdownTick>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            // A stalled runtime still owes every elapsed second.
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                if ticks.send(CountdownTick { attempt }).is_err() {
                    break;
                }
            }
        });
        Self { attempt, task }
    }

    pub(crate) fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub(crate) fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        let countdown = Countdown::start(AttemptId::new(7), tx);

        for second in 1..=3 {
            let tick = rx.recv().await.unwrap();
            assert_eq!(tick.attempt(), AttemptId::new(7));
            assert_eq!(started.elapsed(), Duration::from_secs(second));
        }
        countdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let countdown = Countdown::start(AttemptId::new(1), tx);
        rx.recv().await.unwrap();
        countdown.cancel();

        // The sender lived inside the aborted task, so the channel closes.
        assert!(rx.recv().await.is_none());
    }
}
