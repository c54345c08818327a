//! vigil-store — Tamper-evident submission records.
//!
//! A `SubmissionRecord` freezes everything a finished session produced:
//! the answer snapshot, the integrity state, and the completion reason.
//! Each record is content-hashed with BLAKE3 so later modification is
//! detectable, then archived as JSON by the file-backed store.

pub mod hash;
pub mod repo;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::types::{
    AnswerEntry, AssessmentId, CandidateId, CompletionReason, IntegrityState, SessionId,
};

/// The immutable result of a completed session.
///
/// Created exactly once per session by the submission assembler and
/// never mutated afterwards; the engine keeps it in memory until the
/// persistence hand-off has succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionRecord {
    /// The session this record archives.
    pub session_id: SessionId,
    /// Assessment the candidate was taking.
    pub assessment_id: AssessmentId,
    /// The candidate who took it.
    pub candidate_id: CandidateId,
    /// Answer snapshot in question order.
    pub answers: Vec<AnswerEntry>,
    /// Wall-clock seconds spent before completion.
    pub time_spent_seconds: u64,
    /// Integrity state frozen at submit time.
    pub integrity: IntegrityState,
    /// When the session reached its terminal state.
    pub completed_at: DateTime<Utc>,
    /// Whether the candidate submitted or the clock ran out.
    pub completion_reason: CompletionReason,
    /// BLAKE3 content hash (hex) — set on finalization.
    pub content_hash: Option<String>,
}

impl SubmissionRecord {
    /// Compute and return the BLAKE3 hash of the record's content.
    /// The hash covers all fields except `content_hash` itself.
    pub fn compute_hash(&self) -> String {
        hash::compute_record_hash(self)
    }

    /// Set the content hash, sealing the record.
    pub fn finalize(mut self) -> Self {
        let hash = self.compute_hash();
        self.content_hash = Some(hash);
        self
    }

    /// Verify that the stored content_hash matches a freshly computed hash.
    pub fn verify_integrity(&self) -> bool {
        match &self.content_hash {
            Some(stored) => stored == &self.compute_hash(),
            None => false,
        }
    }
}
