//! Debounce timer driver
//!
//! Interprets [`TimerEffect`]s against real tokio timers. Each `Arm` spawns
//! a sleep task that reports its generation back over a channel; `Cancel`
//! (or a newer `Arm`) aborts the previous task. The controller discards
//! fires whose generation is stale, so the driver only has to be prompt,
//! not exact.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::autosave::TimerEffect;

/// Ticks the driver delivers back to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTick {
    /// The debounce delay elapsed for the given timer generation.
    DebounceFired { generation: u64 },
}

/// Owns at most one pending sleep task.
#[derive(Debug)]
pub struct TimerDriver {
    tx: mpsc::UnboundedSender<EditorTick>,
    pending: Option<JoinHandle<()>>,
}

impl TimerDriver {
    /// Create a driver and the receiver the session loop polls for ticks.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EditorTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, pending: None }, rx)
    }

    /// Apply a batch of effects in order.
    pub fn apply_all(&mut self, effects: impl IntoIterator<Item = TimerEffect>) {
        for effect in effects {
            self.apply(effect);
        }
    }

    pub fn apply(&mut self, effect: TimerEffect) {
        match effect {
            TimerEffect::Arm { generation, delay } => {
                self.abort_pending();
                debug!(generation, ?delay, "arming debounce timer");
                let tx = self.tx.clone();
                self.pending = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // Receiver gone means the session closed; nothing to do.
                    let _ = tx.send(EditorTick::DebounceFired { generation });
                }));
            }
            TimerEffect::Cancel { generation } => {
                debug!(generation, "cancelling debounce timer");
                self.abort_pending();
            }
        }
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.abort_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_with_its_generation() {
        let (mut driver, mut rx) = TimerDriver::new();
        driver.apply(TimerEffect::Arm {
            generation: 7,
            delay: Duration::from_millis(1500),
        });

        tokio::time::advance(Duration::from_millis(1501)).await;
        assert_eq!(rx.recv().await, Some(EditorTick::DebounceFired { generation: 7 }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_fire() {
        let (mut driver, mut rx) = TimerDriver::new();
        driver.apply(TimerEffect::Arm {
            generation: 0,
            delay: Duration::from_millis(1500),
        });
        driver.apply(TimerEffect::Cancel { generation: 0 });

        tokio::time::advance(Duration::from_millis(2000)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_replaces_the_previous_timer() {
        let (mut driver, mut rx) = TimerDriver::new();
        driver.apply_all([
            TimerEffect::Arm {
                generation: 0,
                delay: Duration::from_millis(1500),
            },
            TimerEffect::Cancel { generation: 0 },
            TimerEffect::Arm {
                generation: 1,
                delay: Duration::from_millis(1500),
            },
        ]);

        tokio::time::advance(Duration::from_millis(1501)).await;
        assert_eq!(rx.recv().await, Some(EditorTick::DebounceFired { generation: 1 }));
        assert!(rx.try_recv().is_err());
    }
}
