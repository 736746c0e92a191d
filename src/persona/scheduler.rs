//! Recurring idle-chat timer.
//!
//! Fires a callback at a fixed interval until stopped. Starting while
//! already running does nothing, and stopping is idempotent.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

pub struct IdleScheduler {
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IdleScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.task().as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Begin ticking. `on_tick` returns false to end the timer from inside.
    /// Returns whether a new timer was started.
    pub fn start<F>(&self, on_tick: F) -> bool
    where
        F: Fn() -> bool + Send + 'static,
    {
        let mut task = self.task();
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, idle chat not started");
            return false;
        };

        let period = self.interval;
        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !on_tick() {
                    break;
                }
            }
        });

        *task = Some(handle);
        info!("Idle chat started (every {}s)", period.as_secs());
        true
    }

    /// Cancel the timer. Returns whether one was running.
    pub fn stop(&self) -> bool {
        let Some(handle) = self.task().take() else {
            return false;
        };
        let was_running = !handle.is_finished();
        handle.abort();
        if was_running {
            info!("Idle chat stopped");
        }
        was_running
    }
}

impl Drop for IdleScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
