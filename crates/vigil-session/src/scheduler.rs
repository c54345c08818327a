//! Periodic task scheduling.
//!
//! All polling loops in the engine (session clock, face sampler, screen
//! sampler) go through the `Scheduler` trait rather than raw platform
//! timers, so tests can drive time deterministically with
//! `ManualScheduler` while production uses tokio intervals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A periodic callback registered with a scheduler.
pub type Task = Box<dyn FnMut() + Send>;

/// Cancellation handle for a scheduled task. Cancel is idempotent; a
/// cancelled task never fires again.
#[derive(Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Periodic task scheduling seam.
pub trait Scheduler: Send + Sync {
    /// Run `task` every `period` until the returned handle is cancelled.
    /// The first invocation happens one full period after registration.
    fn every(&self, period: Duration, task: Task) -> TaskHandle;
}

/// Production scheduler: one tokio task per registration, driven by
/// `tokio::time::interval`. The cancellation flag is checked before
/// every invocation so a tick already queued at cancel time is a no-op.
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn every(&self, period: Duration, mut task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let task_handle = handle.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first interval tick completes immediately; consume it
            // so the task first fires one period from now.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if task_handle.is_cancelled() {
                    break;
                }
                task();
            }
        });

        handle
    }
}

/// Deterministic scheduler for tests: tasks fire only when virtual time
/// is advanced explicitly. Due tasks run in timestamp order, ties broken
/// by registration order.
///
/// Tasks run while the internal registry lock is held, so a task must
/// not register new tasks on the same scheduler (cancelling handles is
/// fine).
pub struct ManualScheduler {
    inner: Mutex<ManualInner>,
}

struct ManualInner {
    now: Duration,
    tasks: Vec<ManualTask>,
}

struct ManualTask {
    period: Duration,
    next_due: Duration,
    task: Task,
    handle: TaskHandle,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ManualInner {
                now: Duration::ZERO,
                tasks: Vec::new(),
            }),
        }
    }

    /// Advance virtual time, firing every due task in order.
    pub fn advance(&self, delta: Duration) {
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        let target = inner.now + delta;

        loop {
            // Earliest due non-cancelled task at or before `target`.
            let next = inner
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| !t.handle.is_cancelled() && t.next_due <= target)
                .min_by_key(|(idx, t)| (t.next_due, *idx))
                .map(|(idx, _)| idx);

            let Some(idx) = next else { break };
            let due = inner.tasks[idx].next_due;
            let period = inner.tasks[idx].period;
            inner.now = due;
            inner.tasks[idx].next_due = due + period;
            (inner.tasks[idx].task)();
        }

        inner.now = target;
        inner.tasks.retain(|t| !t.handle.is_cancelled());
    }

    /// Number of live (non-cancelled) tasks.
    pub fn live_tasks(&self) -> usize {
        let inner = self.inner.lock().expect("scheduler lock poisoned");
        inner
            .tasks
            .iter()
            .filter(|t| !t.handle.is_cancelled())
            .count()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn every(&self, period: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let mut inner = self.inner.lock().expect("scheduler lock poisoned");
        let next_due = inner.now + period;
        inner.tasks.push(ManualTask {
            period,
            next_due,
            task,
            handle: handle.clone(),
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn manual_scheduler_fires_on_period() {
        let scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();

        scheduler.every(
            Duration::from_secs(2),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        scheduler.advance(Duration::from_secs(6));
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn cancelled_task_never_fires_again() {
        let scheduler = ManualScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();

        let handle = scheduler.every(
            Duration::from_secs(1),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        scheduler.advance(Duration::from_secs(3));
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.cancel();
        handle.cancel(); // idempotent
        scheduler.advance(Duration::from_secs(10));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.live_tasks(), 0);
    }

    #[test]
    fn interleaved_tasks_fire_in_time_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = order.clone();
        scheduler.every(
            Duration::from_secs(1),
            Box::new(move || o.lock().unwrap().push("fast")),
        );
        let o = order.clone();
        scheduler.every(
            Duration::from_secs(2),
            Box::new(move || o.lock().unwrap().push("slow")),
        );

        scheduler.advance(Duration::from_secs(2));
        assert_eq!(order.lock().unwrap().as_slice(), &["fast", "fast", "slow"]);
    }
}
