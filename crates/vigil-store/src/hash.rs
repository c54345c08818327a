//! BLAKE3 content hashing for tamper evidence.
//!
//! Computes a deterministic hash of all submission-record fields
//! (excluding the content_hash itself) so that any modification is
//! detectable.

use serde::Serialize;

use vigil_core::types::{
    AnswerEntry, AssessmentId, CandidateId, CompletionReason, IntegrityState, SessionId,
};

use crate::SubmissionRecord;

/// Hashable representation of a record (excludes content_hash).
#[derive(Serialize)]
struct HashableRecord<'a> {
    session_id: &'a SessionId,
    assessment_id: &'a AssessmentId,
    candidate_id: &'a CandidateId,
    answers: &'a [AnswerEntry],
    time_spent_seconds: u64,
    integrity: &'a IntegrityState,
    completed_at: &'a chrono::DateTime<chrono::Utc>,
    completion_reason: &'a CompletionReason,
}

/// Compute the BLAKE3 hash of a submission record's content.
///
/// Serializes all fields except `content_hash` to canonical JSON,
/// then hashes the bytes with BLAKE3. Returns the hex-encoded hash.
pub fn compute_record_hash(record: &SubmissionRecord) -> String {
    let hashable = HashableRecord {
        session_id: &record.session_id,
        assessment_id: &record.assessment_id,
        candidate_id: &record.candidate_id,
        answers: &record.answers,
        time_spent_seconds: record.time_spent_seconds,
        integrity: &record.integrity,
        completed_at: &record.completed_at,
        completion_reason: &record.completion_reason,
    };

    let json = serde_json::to_vec(&hashable).expect("record serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
