//! Session countdown clock.
//!
//! Owns the one-second-resolution countdown and fires a one-shot expiry
//! handler exactly once when it reaches zero. `stop()` both cancels the
//! scheduled tick and raises a stopped flag that the tick handler checks
//! before firing expiry, so a tick already queued at stop time can never
//! produce a late expiry.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::scheduler::{Scheduler, TaskHandle};

type ExpireFn = Box<dyn FnOnce() + Send>;
type TickFn = Box<dyn FnMut(u64) + Send>;

/// Countdown timer for one session.
pub struct SessionClock {
    scheduler: Arc<dyn Scheduler>,
    resolution: Duration,
    remaining: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
    on_expire: Arc<Mutex<Option<ExpireFn>>>,
    on_tick: Arc<Mutex<Option<TickFn>>>,
    handle: Mutex<Option<TaskHandle>>,
}

impl SessionClock {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_resolution(scheduler, Duration::from_secs(1))
    }

    pub fn with_resolution(scheduler: Arc<dyn Scheduler>, resolution: Duration) -> Self {
        Self {
            scheduler,
            resolution,
            remaining: Arc::new(AtomicU64::new(0)),
            stopped: Arc::new(AtomicBool::new(true)),
            on_expire: Arc::new(Mutex::new(None)),
            on_tick: Arc::new(Mutex::new(None)),
            handle: Mutex::new(None),
        }
    }

    /// Register the one-shot expiry handler. Replaces any prior handler.
    pub fn on_expire(&self, f: impl FnOnce() + Send + 'static) {
        *self.on_expire.lock().expect("clock lock poisoned") = Some(Box::new(f));
    }

    /// Register a per-second observer of the remaining time.
    pub fn on_tick(&self, f: impl FnMut(u64) + Send + 'static) {
        *self.on_tick.lock().expect("clock lock poisoned") = Some(Box::new(f));
    }

    /// Begin the countdown. Calling `start` on a running clock is a
    /// programming error and panics; there is no silent restart.
    pub fn start(&self, duration_seconds: u64) {
        assert!(!self.is_running(), "session clock already running");

        self.remaining.store(duration_seconds, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);

        let remaining = self.remaining.clone();
        let stopped = self.stopped.clone();
        let on_expire = self.on_expire.clone();
        let on_tick = self.on_tick.clone();

        let tick_handle = self.scheduler.every(
            self.resolution,
            Box::new(move || {
                // A tick can already be queued when stop() lands; the
                // flag makes it a no-op instead of a late expiry.
                if stopped.load(Ordering::SeqCst) {
                    return;
                }

                let left = remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                        Some(v.saturating_sub(1))
                    })
                    .map(|prev| prev.saturating_sub(1))
                    .unwrap_or(0);

                if let Some(tick) = on_tick.lock().expect("clock lock poisoned").as_mut() {
                    tick(left);
                }

                if left == 0 && !stopped.swap(true, Ordering::SeqCst) {
                    if let Some(expire) = on_expire.lock().expect("clock lock poisoned").take() {
                        expire();
                    }
                }
            }),
        );

        *self.handle.lock().expect("clock lock poisoned") = Some(tick_handle);
    }

    /// Seconds left on the countdown.
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Cancel the countdown. Safe to call repeatedly and before start;
    /// guarantees the expiry handler will not fire afterwards.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().expect("clock lock poisoned").take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use std::sync::atomic::AtomicUsize;

    fn clock_on(scheduler: &Arc<ManualScheduler>) -> SessionClock {
        SessionClock::new(scheduler.clone() as Arc<dyn Scheduler>)
    }

    #[test]
    fn counts_down_and_expires_once() {
        let scheduler = Arc::new(ManualScheduler::new());
        let clock = clock_on(&scheduler);
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        clock.on_expire(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        clock.start(3);
        assert_eq!(clock.remaining(), 3);

        scheduler.advance(Duration::from_secs(2));
        assert_eq!(clock.remaining(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(clock.remaining(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // Further ticks cannot re-fire the one-shot handler.
        scheduler.advance(Duration::from_secs(5));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_prevents_late_expiry() {
        let scheduler = Arc::new(ManualScheduler::new());
        let clock = clock_on(&scheduler);
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        clock.on_expire(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        clock.start(2);

        scheduler.advance(Duration::from_secs(1));
        clock.stop();

        // Ticks queued or scheduled after stop never fire expiry.
        scheduler.advance(Duration::from_secs(10));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn tick_observer_sees_each_second() {
        let scheduler = Arc::new(ManualScheduler::new());
        let clock = clock_on(&scheduler);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        clock.on_tick(move |left| s.lock().unwrap().push(left));
        clock.start(3);

        scheduler.advance(Duration::from_secs(3));
        assert_eq!(seen.lock().unwrap().as_slice(), &[2, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "session clock already running")]
    fn double_start_panics() {
        let scheduler = Arc::new(ManualScheduler::new());
        let clock = clock_on(&scheduler);
        clock.start(10);
        clock.start(10);
    }
}
