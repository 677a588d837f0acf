//! Cancellable deferred actions.
//!
//! A [`Debouncer`] holds at most one pending action. Re-arming replaces the
//! pending action and restarts the delay, so only the last action armed within
//! a burst runs, once input has been quiet for the full delay.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Default quiet period before auto-classification
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Schedules one deferred action at a time
///
/// Actions run on a spawned task after the delay elapses, never inside
/// [`Debouncer::arm`]. Requires a running tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay`, replacing any pending action
    pub fn arm<F>(&mut self, action: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            action();
        }));
    }

    /// Drop the pending action, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether an action is waiting for its delay to elapse
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_millis(800);

    #[tokio::test(start_paused = true)]
    async fn test_last_arm_wins() {
        let start = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new();

        let tx_a = tx.clone();
        debouncer.arm(move || tx_a.send(("A", Instant::now())).unwrap(), DELAY);

        sleep(Duration::from_millis(300)).await;
        let tx_b = tx.clone();
        debouncer.arm(move || tx_b.send(("B", Instant::now())).unwrap(), DELAY);

        let (label, fired_at) = rx.recv().await.unwrap();
        assert_eq!(label, "B");
        let elapsed = fired_at.duration_since(start);
        assert!(elapsed >= Duration::from_millis(1100));
        assert!(elapsed < Duration::from_millis(1110));

        // A must never run, even long after its own deadline
        sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_never_runs_inside_arm() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new();

        debouncer.arm(move || tx.send(()).unwrap(), Duration::ZERO);
        assert!(rx.try_recv().is_err());
        assert!(debouncer.is_pending());

        rx.recv().await.unwrap();
        tokio::task::yield_now().await;
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_clears_pending_action() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut debouncer = Debouncer::new();

        // no-op when nothing is pending
        debouncer.cancel();

        debouncer.arm(move || tx.send(()).unwrap(), DELAY);
        sleep(Duration::from_millis(500)).await;
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        sleep(Duration::from_secs(2)).await;
        // the sender was dropped with the aborted task
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        {
            let mut debouncer = Debouncer::new();
            debouncer.arm(move || tx.send(()).unwrap(), DELAY);
        }
        sleep(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_none());
    }
}
