//! vigil-session: Timed, proctored assessment session engine.
//!
//! Composes the session clock, answer ledger, integrity monitor, and
//! environment guard over one shared session state, and assembles the
//! immutable submission record on completion or expiry. All periodic
//! work goes through the `Scheduler` seam; detection, media acquisition,
//! and ambient browser state are injectable, so the whole engine runs
//! deterministically in tests.

pub mod clock;
pub mod detector;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod media;
pub mod monitor;
pub mod scheduler;
pub mod signals;
pub mod submit;

pub use error::SessionError;
pub use submit::SubmitOutcome;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use vigil_core::config::EngineConfig;
use vigil_core::events::{SessionEvent, VigilEvent};
use vigil_core::types::{
    AssessmentDescriptor, CandidateId, CompletionReason, IntegrityState, OptionKey, QuestionId,
    Session, SessionId, SessionStatus,
};
use vigil_store::store::SubmissionStore;
use vigil_store::SubmissionRecord;

use crate::clock::SessionClock;
use crate::detector::FaceDetector;
use crate::error::Result;
use crate::guard::EnvironmentGuard;
use crate::ledger::AnswerLedger;
use crate::media::{MediaError, MediaHandle, MediaSource};
use crate::monitor::IntegrityMonitor;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::signals::{EnvironmentSignals, EventDisposition};

/// In-process event observer.
pub type Observer = Box<dyn Fn(&VigilEvent) + Send>;

pub(crate) struct EngineState {
    pub(crate) session: Session,
    pub(crate) ledger: AnswerLedger,
    pub(crate) integrity: IntegrityState,
    pub(crate) record: Option<Arc<SubmissionRecord>>,
    pub(crate) persisted: bool,
    pub(crate) media: Option<Box<dyn MediaHandle>>,
    pub(crate) fullscreen_entered: bool,
}

pub(crate) struct Shared {
    pub(crate) session_id: SessionId,
    pub(crate) state: Mutex<EngineState>,
    pub(crate) observers: Mutex<Vec<Observer>>,
    pub(crate) handles: Mutex<Vec<TaskHandle>>,
    pub(crate) signals: Arc<dyn EnvironmentSignals>,
    pub(crate) store: Arc<dyn SubmissionStore>,
}

pub(crate) fn lock_state(shared: &Shared) -> MutexGuard<'_, EngineState> {
    shared.state.lock().expect("engine state lock poisoned")
}

pub(crate) fn emit(shared: &Shared, payload: SessionEvent) {
    let event = VigilEvent::new(shared.session_id, payload);
    let observers = shared.observers.lock().expect("observer lock poisoned");
    for observer in observers.iter() {
        observer(&event);
    }
}

fn red_flag_event(flag: vigil_core::types::RedFlag) -> SessionEvent {
    SessionEvent::RedFlagRaised {
        description: flag.description,
        severity: flag.severity,
        origin: flag.origin,
    }
}

/// The assessment session engine.
///
/// One engine owns exactly one session; the camera stream it acquires
/// is released on submission, expiry, or drop, whichever comes first.
pub struct SessionEngine {
    shared: Arc<Shared>,
    clock: Arc<SessionClock>,
    scheduler: Arc<dyn Scheduler>,
    detector: Arc<dyn FaceDetector>,
    media: Arc<dyn MediaSource>,
    monitor: IntegrityMonitor,
    guard: EnvironmentGuard,
    config: EngineConfig,
}

impl SessionEngine {
    /// Create an engine for one candidate's attempt at `assessment`,
    /// with the default configuration.
    pub fn new(
        assessment: &AssessmentDescriptor,
        candidate_id: CandidateId,
        scheduler: Arc<dyn Scheduler>,
        detector: Arc<dyn FaceDetector>,
        media: Arc<dyn MediaSource>,
        signals: Arc<dyn EnvironmentSignals>,
        store: Arc<dyn SubmissionStore>,
    ) -> Self {
        let config = EngineConfig::default();
        let session = Session::new(
            assessment.assessment_id,
            candidate_id,
            assessment.question_order(),
            assessment.duration_seconds,
        );
        let ledger = AnswerLedger::new(&session.question_order);

        let shared = Arc::new(Shared {
            session_id: session.session_id,
            state: Mutex::new(EngineState {
                session,
                ledger,
                integrity: IntegrityState::new(),
                record: None,
                persisted: false,
                media: None,
                fullscreen_entered: false,
            }),
            observers: Mutex::new(Vec::new()),
            handles: Mutex::new(Vec::new()),
            signals,
            store,
        });

        let clock = Arc::new(SessionClock::with_resolution(
            scheduler.clone(),
            Duration::from_secs(config.clock_resolution_secs),
        ));

        Self {
            shared,
            clock,
            scheduler,
            detector,
            media,
            monitor: IntegrityMonitor::new(config.flag_penalty),
            guard: EnvironmentGuard::new(config.flag_penalty),
            config,
        }
    }

    /// Replace the default configuration. Must be called before `start`.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.clock = Arc::new(SessionClock::with_resolution(
            self.scheduler.clone(),
            Duration::from_secs(config.clock_resolution_secs),
        ));
        self.monitor = IntegrityMonitor::new(config.flag_penalty);
        self.guard = EnvironmentGuard::new(config.flag_penalty);
        self.config = config;
        self
    }

    pub fn session_id(&self) -> SessionId {
        self.shared.session_id
    }

    pub fn status(&self) -> SessionStatus {
        lock_state(&self.shared).session.status
    }

    /// Register an event observer. Observers receive every red flag,
    /// integrity snapshot, clock tick, and the final submission event.
    /// They are invoked on the sampling thread and must not call back
    /// into the engine.
    pub fn subscribe(&self, observer: impl Fn(&VigilEvent) + Send + 'static) {
        self.shared
            .observers
            .lock()
            .expect("observer lock poisoned")
            .push(Box::new(observer));
    }

    /// Start the session: enter fullscreen, start the countdown and the
    /// screen sampler, subscribe the environment guard, then acquire the
    /// camera. Acquisition is awaited without blocking the samplers; on
    /// permission denial the session continues with screen-only
    /// monitoring.
    pub async fn start(&self) -> Result<()> {
        let (assessment_id, candidate_id, duration) = {
            let mut st = lock_state(&self.shared);
            st.session
                .begin()
                .map_err(|_| SessionError::AlreadyStarted)?;
            st.fullscreen_entered = true;
            (
                st.session.assessment_id,
                st.session.candidate_id,
                st.session.duration_limit_seconds,
            )
        };

        self.shared.signals.request_fullscreen();
        emit(
            &self.shared,
            SessionEvent::SessionStarted {
                assessment_id,
                candidate_id,
            },
        );
        tracing::info!(
            session_id = %self.shared.session_id,
            assessment_id = %assessment_id,
            duration_seconds = duration,
            "Session started"
        );

        self.wire_clock(duration);
        self.start_screen_sampler();
        self.subscribe_guard();

        match self.media.acquire().await {
            Ok(handle) => {
                let still_active = {
                    let mut st = lock_state(&self.shared);
                    if st.session.is_active() {
                        st.media = Some(handle);
                        true
                    } else {
                        // Session ended during acquisition; the handle
                        // drops here and releases its tracks.
                        false
                    }
                };
                if still_active {
                    self.start_face_sampler();
                }
            }
            Err(MediaError::PermissionDenied) => {
                lock_state(&self.shared).integrity.permission_denied = true;
                tracing::warn!(
                    session_id = %self.shared.session_id,
                    "Camera permission denied; continuing with screen-only monitoring"
                );
                emit(&self.shared, SessionEvent::PermissionDenied);
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.shared.session_id,
                    error = %e,
                    "Media acquisition failed; continuing with screen-only monitoring"
                );
            }
        }

        Ok(())
    }

    fn wire_clock(&self, duration: u64) {
        let shared = self.shared.clone();
        self.clock.on_tick(move |remaining| {
            emit(
                &shared,
                SessionEvent::ClockTick {
                    remaining_seconds: remaining,
                },
            );
        });

        let shared = self.shared.clone();
        // Weak, not Arc: the clock owns this callback, so a strong
        // reference back to the clock would never be dropped.
        let clock = Arc::downgrade(&self.clock);
        self.clock.on_expire(move || {
            let stop = || {
                if let Some(clock) = clock.upgrade() {
                    clock.stop();
                }
            };
            if let Err(e) = submit::finalize(&shared, 0, stop, CompletionReason::TimeExpired) {
                tracing::error!(error = %e, "Expiry finalization failed");
            }
        });

        self.clock.start(duration);
    }

    fn start_screen_sampler(&self) {
        let shared = self.shared.clone();
        let signals = self.shared.signals.clone();
        let monitor = self.monitor;

        let handle = self.scheduler.every(
            Duration::from_secs(self.config.screen_sample_interval_secs),
            Box::new(move || {
                let mut events = Vec::new();
                {
                    let mut st = lock_state(&shared);
                    if !st.session.is_active() {
                        return;
                    }
                    let flags = monitor.screen_sample(
                        &mut st.integrity,
                        signals.is_hidden(),
                        signals.is_fullscreen(),
                    );
                    events.extend(flags.into_iter().map(red_flag_event));
                    events.push(SessionEvent::IntegritySampled {
                        state: st.integrity.clone(),
                    });
                }
                for event in events {
                    emit(&shared, event);
                }
            }),
        );

        self.shared
            .handles
            .lock()
            .expect("handle lock poisoned")
            .push(handle);
    }

    fn start_face_sampler(&self) {
        let shared = self.shared.clone();
        let detector = self.detector.clone();
        let monitor = self.monitor;

        let handle = self.scheduler.every(
            Duration::from_secs(self.config.face_sample_interval_secs),
            Box::new(move || {
                let mut events = Vec::new();
                {
                    let mut st = lock_state(&shared);
                    if !st.session.is_active() {
                        return;
                    }
                    let sample = detector.sample();
                    let flags = monitor.face_sample(&mut st.integrity, &sample);
                    events.extend(flags.into_iter().map(red_flag_event));
                    events.push(SessionEvent::IntegritySampled {
                        state: st.integrity.clone(),
                    });
                }
                for event in events {
                    emit(&shared, event);
                }
            }),
        );

        self.shared
            .handles
            .lock()
            .expect("handle lock poisoned")
            .push(handle);
    }

    fn subscribe_guard(&self) {
        let shared = self.shared.clone();
        let guard = self.guard;

        self.shared.signals.subscribe(Box::new(move |event| {
            let raised = {
                let mut st = lock_state(&shared);
                if !st.session.is_active() {
                    return EventDisposition::Allow;
                }
                let (flag, disposition) = guard.observe(&mut st.integrity, &event);
                debug_assert_eq!(disposition, EventDisposition::Suppress);
                red_flag_event(flag)
            };
            emit(&shared, raised);
            EventDisposition::Suppress
        }));
    }

    // ── Candidate interaction ──────────────────────────────────────

    /// Record (or overwrite) an answer. Rejected once the session is
    /// terminal or for a question outside the session's order.
    pub fn set_answer(&self, question_id: QuestionId, option: OptionKey) -> Result<()> {
        let mut st = lock_state(&self.shared);
        if !st.session.is_active() {
            return Err(SessionError::NotActive);
        }
        st.ledger.set_answer(question_id, option)
    }

    /// Toggle the review flag on a question; returns the new state.
    pub fn toggle_flag(&self, question_id: QuestionId) -> Result<bool> {
        let mut st = lock_state(&self.shared);
        if !st.session.is_active() {
            return Err(SessionError::NotActive);
        }
        st.ledger.toggle_flag(question_id)
    }

    pub fn answered_count(&self) -> usize {
        lock_state(&self.shared).ledger.answered_count()
    }

    pub fn progress_fraction(&self) -> f64 {
        lock_state(&self.shared).ledger.progress_fraction()
    }

    /// Seconds left on the countdown.
    pub fn remaining_seconds(&self) -> u64 {
        self.clock.remaining()
    }

    /// A point-in-time copy of the integrity state.
    pub fn integrity(&self) -> IntegrityState {
        lock_state(&self.shared).integrity.clone()
    }

    /// The assembled record, once the session is terminal.
    pub fn record(&self) -> Option<Arc<SubmissionRecord>> {
        lock_state(&self.shared).record.clone()
    }

    /// Confirmation message the host must show before leave/reload, if
    /// the session is still in progress.
    pub fn navigation_prompt(&self) -> Option<&'static str> {
        EnvironmentGuard::navigation_prompt(self.status())
    }

    // ── Completion ─────────────────────────────────────────────────

    /// Submit the session. Callable at most once; a second call returns
    /// the already-produced record with no repeated side effects.
    pub fn submit(&self) -> Result<SubmitOutcome> {
        let remaining = self.clock.remaining();
        let clock = self.clock.clone();
        submit::finalize(
            &self.shared,
            remaining,
            move || clock.stop(),
            CompletionReason::UserSubmitted,
        )
    }

    /// Resend the already-assembled record after a failed hand-off.
    /// Never reassembles the session.
    pub fn retry_persist(&self) -> Result<()> {
        let record = lock_state(&self.shared)
            .record
            .clone()
            .ok_or(SessionError::NoRecord)?;
        self.shared.store.save(&record)?;
        lock_state(&self.shared).persisted = true;
        tracing::info!(
            session_id = %self.shared.session_id,
            "Submission hand-off retried successfully"
        );
        Ok(())
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        self.clock.stop();
        for handle in self
            .shared
            .handles
            .lock()
            .expect("handle lock poisoned")
            .drain(..)
        {
            handle.cancel();
        }
        if let Some(mut media) = lock_state(&self.shared).media.take() {
            media.stop();
        }
    }
}
