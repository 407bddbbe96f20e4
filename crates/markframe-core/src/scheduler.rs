//! Cancelable delayed tasks.
//!
//! `schedule(key, delay, task)` runs `task` after `delay` unless another
//! task is scheduled under the same key first, in which case the pending one
//! is aborted. This is the debounce used for post-processing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tracing::trace;

type PendingMap = HashMap<&'static str, (u64, AbortHandle)>;

/// Handle to one scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    key: &'static str,
    id: u64,
    pending: Arc<Mutex<PendingMap>>,
}

impl TaskHandle {
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Abort the task if it has not started yet.
    ///
    /// Returns false if it already ran or was superseded.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock();
        match pending.get(self.key) {
            Some((id, abort)) if *id == self.id => {
                abort.abort();
                pending.remove(self.key);
                true
            }
            _ => false,
        }
    }

    /// True while this task is still waiting for its delay.
    pub fn is_pending(&self) -> bool {
        matches!(self.pending.lock().get(self.key), Some((id, _)) if *id == self.id)
    }
}

/// Keyed scheduler of one-shot delayed tasks.
#[derive(Debug, Default, Clone)]
pub struct TaskScheduler {
    pending: Arc<Mutex<PendingMap>>,
    next_id: Arc<AtomicU64>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` after `delay`, replacing any pending task for `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: &'static str, delay: Duration, task: F) -> TaskHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);

        // Hold the lock across spawn + insert so the task cannot observe the
        // map before its own entry is registered.
        let mut guard = self.pending.lock();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = pending.lock();
                match map.get(key) {
                    Some((current, _)) if *current == id => {
                        map.remove(key);
                    }
                    _ => return,
                }
            }
            trace!(key, id, "running scheduled task");
            task();
        });
        if let Some((previous, abort)) = guard.insert(key, (id, join.abort_handle())) {
            trace!(key, previous, "superseding pending task");
            abort.abort();
        }
        drop(guard);

        TaskHandle {
            key,
            id,
            pending: Arc::clone(&self.pending),
        }
    }

    /// Cancel whatever is pending under `key`.
    pub fn cancel(&self, key: &'static str) -> bool {
        match self.pending.lock().remove(key) {
            Some((_, abort)) => {
                abort.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &'static str) -> bool {
        self.pending.lock().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_task_runs_after_delay() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = scheduler.schedule("job", Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(handle.is_pending());

        tokio::time::sleep(Duration::from_millis(49)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!handle.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_cancels_previous() {
        let scheduler = TaskScheduler::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for value in 0..5 {
            let seen = Arc::clone(&seen);
            scheduler.schedule("debounce", Duration::from_millis(50), move || {
                seen.lock().push(value);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock(), vec![4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_do_not_interfere() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        for key in ["a", "b"] {
            let counter = Arc::clone(&runs);
            scheduler.schedule(key, Duration::from_millis(20), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_handle() {
        let scheduler = TaskScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = scheduler.schedule("job", Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(!scheduler.is_pending("job"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_handle_cannot_cancel_newer_task() {
        let scheduler = TaskScheduler::new();
        let first = scheduler.schedule("job", Duration::from_millis(50), || {});
        let second = scheduler.schedule("job", Duration::from_millis(50), || {});
        assert!(!first.cancel());
        assert!(second.is_pending());
    }
}
