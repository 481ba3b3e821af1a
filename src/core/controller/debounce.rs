//! Quiet-period debouncing of query side effects

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

struct Pending {
    /// Cleared by whoever claims the timer first: the timer itself or a canceller
    armed: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Collapses bursts of scheduled actions into the last one
///
/// Each [`schedule`](Debouncer::schedule) cancels a timer that has not fired
/// yet and arms a new one. A timer that already fired runs to completion.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<Pending>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` once the quiet period elapses without another schedule
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let armed = Arc::new(AtomicBool::new(true));
        let flag = armed.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.swap(false, Ordering::SeqCst) {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "debounce fired");
                action.await;
            }
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Pending { armed, handle });

        if let Some(previous) = previous {
            Self::disarm(previous);
        }
    }

    /// Cancel a timer that has not fired yet; returns whether one was cancelled
    pub fn cancel(&self) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        pending.map(Self::disarm).unwrap_or(false)
    }

    /// Whether a timer is armed and has not fired
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|p| p.armed.load(Ordering::SeqCst))
    }

    /// Wait for the most recently scheduled action to fire and finish
    pub async fn flush(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            // An aborted task resolves with a JoinError; nothing to report.
            let _ = pending.handle.await;
        }
    }

    fn disarm(pending: Pending) -> bool {
        if pending.armed.swap(false, Ordering::SeqCst) {
            pending.handle.abort();
            tracing::debug!("debounce timer cancelled");
            true
        } else {
            false
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(pending) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Self::disarm(pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn bump(count: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let count = count.clone();
        async move {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let count = counter();

        for _ in 0..5 {
            debouncer.schedule(bump(&count));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        debouncer.flush().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_schedules_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let count = counter();

        debouncer.schedule(bump(&count));
        tokio::time::sleep(Duration::from_millis(150)).await;
        debouncer.schedule(bump(&count));
        debouncer.flush().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let count = counter();

        debouncer.schedule(bump(&count));
        assert!(debouncer.is_pending());
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_without_pending_returns() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.flush().await;
    }
}
