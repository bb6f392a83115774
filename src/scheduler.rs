//! Fixed-interval tick scheduler
//!
//! One tokio task per `start()`. The task calls the tick callback once per
//! interval until the callback breaks or `stop()` aborts it. Must be used
//! from within a tokio runtime.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Default)]
pub struct TickScheduler {
    handle: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a tick task is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the tick task. No-op (returns false) if one is already running.
    ///
    /// The first tick fires one `period` after starting. Late ticks are
    /// skipped rather than bunched, so callbacks never pile up.
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F) -> bool
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        }));
        log::debug!("Tick scheduler started ({:?} interval)", period);
        true
    }

    /// Abort the tick task. Returns false if there was nothing to stop.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                log::debug!("Tick scheduler stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter() -> (Arc<AtomicU32>, impl FnMut() -> ControlFlow<()> + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_interval() {
        let (count, on_tick) = counter();
        let mut scheduler = TickScheduler::new();
        assert!(scheduler.start(Duration::from_millis(100), on_tick));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let (count, on_tick) = counter();
        let (_, other) = counter();
        let mut scheduler = TickScheduler::new();
        assert!(scheduler.start(Duration::from_millis(100), on_tick));
        assert!(!scheduler.start(Duration::from_millis(100), other));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks_and_is_idempotent() {
        let (count, on_tick) = counter();
        let mut scheduler = TickScheduler::new();
        scheduler.start(Duration::from_millis(100), on_tick);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());

        let seen = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_ends_task_and_allows_restart() {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let mut scheduler = TickScheduler::new();
        scheduler.start(Duration::from_millis(10), move || {
            if c.fetch_add(1, Ordering::SeqCst) + 1 >= 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(!scheduler.is_running());

        let (_, on_tick) = counter();
        assert!(scheduler.start(Duration::from_millis(10), on_tick));
    }
}
