//! Submission assembly.
//!
//! Merges the session, the answer ledger, and the frozen integrity
//! state into one immutable, content-hashed record, exactly once per
//! session. The assembled record is retained in memory even when the
//! persistence hand-off fails, so a retry resends the same record
//! instead of reassembling the session.

use std::sync::Arc;

use chrono::Utc;

use vigil_core::events::SessionEvent;
use vigil_core::types::CompletionReason;
use vigil_store::store::SubmissionStore;
use vigil_store::SubmissionRecord;

use crate::error::{Result, SessionError};
use crate::{emit, lock_state, Shared};

/// What `submit` produced. Repeated calls return the same record.
#[derive(Clone)]
pub struct SubmitOutcome {
    /// The immutable submission record.
    pub record: Arc<SubmissionRecord>,
    /// Whether the persistence hand-off has succeeded.
    pub persisted: bool,
}

/// Finalize the session: terminal transition, sampler cancellation,
/// media release, record assembly, fullscreen exit, store hand-off.
///
/// Idempotent: a second call returns the already-produced record with
/// no repeated side effects.
pub(crate) fn finalize(
    shared: &Arc<Shared>,
    remaining_seconds: u64,
    stop_clock: impl FnOnce(),
    reason: CompletionReason,
) -> Result<SubmitOutcome> {
    let outcome = {
        let mut st = lock_state(shared);

        if let Some(record) = &st.record {
            return Ok(SubmitOutcome {
                record: record.clone(),
                persisted: st.persisted,
            });
        }

        st.session
            .finish(reason)
            .map_err(|_| SessionError::NotActive)?;

        // Cancel all periodic work before the record is cut. Every tick
        // handler re-checks the session status under this lock, so a
        // tick already in flight cannot mutate the finalized session.
        for handle in shared
            .handles
            .lock()
            .expect("handle lock poisoned")
            .drain(..)
        {
            handle.cancel();
        }
        stop_clock();

        // Release the capture device.
        if let Some(mut media) = st.media.take() {
            media.stop();
        }

        let time_spent = st
            .session
            .duration_limit_seconds
            .saturating_sub(remaining_seconds);

        let record = Arc::new(
            SubmissionRecord {
                session_id: st.session.session_id,
                assessment_id: st.session.assessment_id,
                candidate_id: st.session.candidate_id,
                answers: st.ledger.snapshot(),
                time_spent_seconds: time_spent,
                integrity: st.integrity.clone(),
                completed_at: Utc::now(),
                completion_reason: reason,
                content_hash: None,
            }
            .finalize(),
        );
        st.record = Some(record.clone());

        if st.fullscreen_entered {
            st.fullscreen_entered = false;
            shared.signals.exit_fullscreen();
        }

        let persisted = match shared.store.save(&record) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    session_id = %st.session.session_id,
                    error = %e,
                    "Submission hand-off failed; record retained for retry"
                );
                false
            }
        };
        st.persisted = persisted;

        tracing::info!(
            session_id = %st.session.session_id,
            reason = ?reason,
            answers = record.answers.len(),
            red_flags = record.integrity.red_flags.len(),
            authenticity_score = record.integrity.authenticity_score,
            time_spent_seconds = time_spent,
            persisted,
            "Session finalized"
        );

        SubmitOutcome { record, persisted }
    };

    emit(
        shared,
        SessionEvent::SessionSubmitted {
            reason,
            time_spent_seconds: outcome.record.time_spent_seconds,
        },
    );

    Ok(outcome)
}
