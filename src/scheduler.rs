//! Deferred-task scheduler: maps a task id to one live, cancellable timer.
//!
//! Each scheduled entry is a spawned tokio task that waits until the
//! deadline, runs its fire future exactly once, and removes its own map
//! entry. Cancellation is observed only at the deadline wait; a fire that
//! has already started is never interrupted, so callers must keep fire
//! actions idempotent.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub type TaskId = i64;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The id already has a live entry. Callers must cancel first;
    /// replacing silently would hide double-scheduling bugs.
    #[error("task {0} is already scheduled")]
    Duplicate(TaskId),
}

struct Entry {
    seq: u64,
    token: CancellationToken,
}

/// Injectable scheduler instance. Cloning yields a handle to the same
/// underlying entry map.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: Mutex<HashMap<TaskId, Entry>>,
    next_seq: AtomicU64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fire` to run once `deadline` is reached. Fails if the id
    /// already has a live entry.
    pub fn schedule<F>(
        &self,
        id: TaskId,
        deadline: DateTime<Utc>,
        fire: F,
    ) -> Result<(), ScheduleError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        {
            let mut entries = self.inner.entries.lock().expect("scheduler lock");
            if entries.contains_key(&id) {
                return Err(ScheduleError::Duplicate(id));
            }
            entries.insert(
                id,
                Entry {
                    seq,
                    token: token.clone(),
                },
            );
        }
        debug!(id, %deadline, "scheduled task");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let delay = (deadline - Utc::now()).to_std().unwrap_or_default();
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(id, "task cancelled before firing");
                    // cancel() already removed the entry.
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            if let Err(err) = fire.await {
                warn!(?err, id, "deferred task failed");
            }

            // Remove only our own entry: a cancel racing with the fire may
            // already have been followed by a fresh schedule under this id.
            let mut entries = inner.entries.lock().expect("scheduler lock");
            if entries.get(&id).is_some_and(|e| e.seq == seq) {
                entries.remove(&id);
                debug!(id, "task fired and removed");
            }
        });

        Ok(())
    }

    /// Cancel a live entry. Idempotent: unknown or already-fired ids are a
    /// no-op. Returns whether an entry was actually cancelled.
    pub fn cancel(&self, id: TaskId) -> bool {
        let entry = self.inner.entries.lock().expect("scheduler lock").remove(&id);
        match entry {
            Some(entry) => {
                entry.token.cancel();
                debug!(id, "cancelled task");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.inner
            .entries
            .lock()
            .expect("scheduler lock")
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().expect("scheduler lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{advance, Duration};

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_deadline_and_removes_entry() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        scheduler
            .schedule(1, Utc::now() + ChronoDuration::seconds(60), async move {
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert!(scheduler.contains(1));

        advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.contains(1));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_schedule_is_rejected() {
        let scheduler = Scheduler::new();
        let deadline = Utc::now() + ChronoDuration::seconds(60);
        scheduler.schedule(7, deadline, async { Ok(()) }).unwrap();
        let err = scheduler
            .schedule(7, deadline, async { Ok(()) })
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Duplicate(7)));
        assert_eq!(scheduler.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        scheduler
            .schedule(2, Utc::now() + ChronoDuration::seconds(30), async move {
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert!(scheduler.cancel(2));

        advance(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!scheduler.contains(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let scheduler = Scheduler::new();
        assert!(!scheduler.cancel(99));
        scheduler
            .schedule(3, Utc::now() + ChronoDuration::seconds(5), async { Ok(()) })
            .unwrap();
        assert!(scheduler.cancel(3));
        assert!(!scheduler.cancel(3));
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fire_failure_still_removes_entry() {
        let scheduler = Scheduler::new();
        scheduler
            .schedule(4, Utc::now() + ChronoDuration::seconds(1), async {
                Err(anyhow::anyhow!("boom"))
            })
            .unwrap();

        advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert!(!scheduler.contains(4));
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_after_cancel_keeps_new_entry_alive() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler
            .schedule(5, Utc::now() + ChronoDuration::seconds(10), async { Ok(()) })
            .unwrap();
        scheduler.cancel(5);

        let f = fired.clone();
        scheduler
            .schedule(5, Utc::now() + ChronoDuration::seconds(60), async move {
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        // Let the cancelled task wind down; the fresh entry must survive it.
        advance(Duration::from_secs(15)).await;
        tokio::task::yield_now().await;
        assert!(scheduler.contains(5));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        advance(Duration::from_secs(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.contains(5));
    }

    #[tokio::test(start_paused = true)]
    async fn overdue_deadline_fires_immediately() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        scheduler
            .schedule(6, Utc::now() - ChronoDuration::seconds(10), async move {
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        advance(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
